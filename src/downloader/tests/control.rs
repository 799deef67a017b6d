use super::*;
use crate::types::ErrorId;

#[tokio::test]
async fn cancelling_queued_job_means_it_is_never_fetched() {
    let (downloader, fetcher, sink) = create_test_downloader(DEFAULT_PART_SIZE_BYTES);
    let mut events = downloader.subscribe();
    let gate = Arc::new(tokio::sync::Notify::new());
    fetcher.script("1", Script::Gated(gate.clone(), b"first".to_vec()));

    downloader.enqueue_track(track_request("1", "One More Time"));
    let pending = downloader.enqueue_album(album_request(
        "Discovery",
        vec![flac_track("2", "A", 1), flac_track("3", "B", 2)],
    ));
    fetcher.wait_for_call("1").await;

    assert!(downloader.cancel_download(pending));
    assert!(downloader.job(pending).is_none());
    gate.notify_one();
    downloader.wait_idle().await;

    assert_eq!(fetcher.calls(), ["1"]);
    assert_eq!(sink.filenames(), ["Daft Punk - One More Time.flac"]);

    let events = drain_events(&mut events);
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::Removed { id } if *id == pending))
    );
    assert!(!events.iter().any(|event| matches!(
        event,
        Event::Started { id } | Event::Cancelled { id } if *id == pending
    )));
}

#[tokio::test]
async fn cancelling_running_job_discards_its_output() {
    let (downloader, fetcher, sink) = create_test_downloader(10);
    let mut events = downloader.subscribe();
    fetcher.script("1", Script::Payload(vec![1; 4]));
    fetcher.script("2", Script::Hang);

    let running = downloader.enqueue_album(album_request(
        "Discovery",
        vec![
            flac_track("1", "A", 1),
            flac_track("2", "B", 2),
            flac_track("3", "C", 3),
        ],
    ));
    downloader.enqueue_track(track_request("4", "Too Long"));
    fetcher.wait_for_call("2").await;

    assert!(downloader.cancel_download(running));
    downloader.wait_idle().await;

    // Track 3 is never requested and nothing of the album reaches the sink
    assert_eq!(fetcher.calls(), ["1", "2", "4"]);
    assert_eq!(sink.filenames(), ["Daft Punk - Too Long.flac"]);
    assert!(downloader.errors().is_empty());

    let events = drain_events(&mut events);
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::Cancelled { id } if *id == running))
    );
    assert!(!events.iter().any(|event| matches!(
        event,
        Event::Finished { id, .. } if *id == running
    )));
}

#[tokio::test]
async fn cancelled_single_track_is_not_saved() {
    let (downloader, fetcher, sink) = create_test_downloader(DEFAULT_PART_SIZE_BYTES);
    fetcher.script("1", Script::Hang);

    let id = downloader.enqueue_track(track_request("1", "One More Time"));
    fetcher.wait_for_call("1").await;
    assert!(downloader.cancel_download(id));
    downloader.wait_idle().await;

    assert!(sink.saved().is_empty());
    assert!(downloader.errors().is_empty());
    assert!(downloader.queue().is_empty());
}

#[tokio::test]
async fn cancel_unknown_job_returns_false() {
    let (downloader, _fetcher, _sink) = create_test_downloader(DEFAULT_PART_SIZE_BYTES);

    assert!(!downloader.cancel_download(JobId(42)));

    let id = downloader.enqueue_track(track_request("1", "One More Time"));
    downloader.wait_idle().await;
    assert!(!downloader.cancel_download(id));
}

#[tokio::test]
async fn dismiss_error_removes_only_that_record() {
    let (downloader, fetcher, _sink) = create_test_downloader(DEFAULT_PART_SIZE_BYTES);
    let mut events = downloader.subscribe();
    fetcher.script("1", Script::Fail(500));
    fetcher.script("2", Script::Fail(404));

    downloader.enqueue_album(album_request(
        "Discovery",
        vec![flac_track("1", "A", 1), flac_track("2", "B", 2)],
    ));
    downloader.wait_idle().await;

    let errors = downloader.errors();
    assert_eq!(
        errors.iter().map(|record| record.id).collect::<Vec<_>>(),
        [ErrorId(1), ErrorId(2)]
    );

    assert!(downloader.dismiss_error(ErrorId(1)));
    let remaining = downloader.errors();
    assert_eq!(remaining, [errors[1].clone()]);

    assert!(!downloader.dismiss_error(ErrorId(1)));
    assert!(
        drain_events(&mut events)
            .iter()
            .any(|event| matches!(event, Event::ErrorDismissed { id: ErrorId(1) }))
    );
}

#[tokio::test]
async fn error_ids_keep_counting_across_jobs() {
    let (downloader, fetcher, _sink) = create_test_downloader(DEFAULT_PART_SIZE_BYTES);
    fetcher.script("1", Script::Fail(500));
    fetcher.script("2", Script::Fail(500));

    downloader.enqueue_album(album_request("Homework", vec![flac_track("1", "A", 1)]));
    downloader.wait_idle().await;
    assert!(downloader.dismiss_error(ErrorId(1)));

    downloader.enqueue_album(album_request("Discovery", vec![flac_track("2", "B", 1)]));
    downloader.wait_idle().await;

    let errors = downloader.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].id, ErrorId(2));
    assert_eq!(errors[0].display_filename, "Daft Punk - Discovery.zip");
}
