//! End-to-end wiring of a broker and ask-user service. Not a TUI: the "UI"
//! here is a single task that subscribes to announced requests and answers
//! the first option of every question, standing in for wherever a real
//! terminal frontend would render the question and collect a keypress.

use std::sync::Arc;
use std::time::Duration;

use messagebus::{
    Answer, BackpressurePolicy, BrokerConfig, CancellationSignal, Capacity, Question,
    QuestionOption, RequestService,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let service = RequestService::new(
        BrokerConfig::builder()
            .capacity(Capacity::Small)
            .policy(BackpressurePolicy::Drop)
            .build()
            .expect("hardcoded broker config is always valid"),
    );

    let ui_cancel = CancellationSignal::new_shared();
    let ui = {
        let service = service.clone();
        let ui_cancel = ui_cancel.clone();
        tokio::spawn(async move { run_auto_answering_ui(service, ui_cancel).await })
    };

    // `request` takes no deadline of its own per spec.md §5 — a caller that
    // wants timeout-like behavior arranges its own `cancel(id)` from another
    // task. Here that's `watch_for_timeout`, racing a 5s sleep against the
    // UI task above actually answering first.
    let watchdog_cancel = CancellationSignal::new_shared();
    let watchdog = {
        let service = service.clone();
        let watchdog_cancel = watchdog_cancel.clone();
        tokio::spawn(async move {
            watch_for_timeout(service, watchdog_cancel, Duration::from_secs(5)).await
        })
    };

    let response = service
        .request(
            "demo-session".to_string(),
            "demo-tool-call".to_string(),
            vec![Question {
                question: "Which package manager should the new service use?".to_string(),
                header: "Package manager".to_string(),
                options: vec![
                    QuestionOption {
                        label: "pnpm".to_string(),
                    },
                    QuestionOption {
                        label: "npm".to_string(),
                    },
                ],
                multi_select: false,
            }],
        )
        .await;

    // The answer arrived (from the UI or from the watchdog's timeout
    // cancellation); stand down the watchdog either way.
    watchdog_cancel.cancel();
    let _ = watchdog.await;

    tracing::info!(?response, "request resolved");
    if response.cancelled {
        println!("request cancelled (no answer within the deadline)");
    } else {
        println!("answered: {response:?}");
    }

    ui_cancel.cancel();
    let _ = ui.await;
}

/// Watches for the next `Created` event on `service` and, if nobody has
/// answered it within `deadline`, cancels it — standing in for the abort
/// path spec.md §5 describes: `request` has no built-in timeout, so this is
/// how a host imposes one. Exits early, without cancelling anything, if
/// `stand_down` fires first (the request already resolved some other way).
async fn watch_for_timeout(
    service: RequestService,
    stand_down: Arc<CancellationSignal>,
    deadline: Duration,
) {
    let (_id, mut created) = service.subscribe(Arc::clone(&stand_down));

    let Some(event) = created.recv().await else {
        return;
    };

    tokio::select! {
        _ = tokio::time::sleep(deadline) => {
            tracing::warn!(request_id = %event.payload.id, ?deadline, "request timed out, cancelling");
            service.cancel(&event.payload.id);
        }
        _ = stand_down.cancelled() => {}
    }
}

/// Stand-in UI: answers every announced request with its first option,
/// until the broker's subscription is cancelled.
async fn run_auto_answering_ui(service: RequestService, cancel: Arc<CancellationSignal>) {
    let (_id, mut requests) = service.subscribe(cancel);

    while let Some(event) = requests.recv().await {
        let record = event.payload;
        tracing::info!(request_id = %record.id, "auto-answering request");

        let answers = record
            .questions
            .iter()
            .enumerate()
            .map(|(index, _)| Answer {
                question_index: index,
                selected_indices: vec![0],
                selected_index: Some(0),
                other_text: None,
                is_other: false,
            })
            .collect();

        service.respond(&record.id, answers);
    }
}
