/// Suspends the current task for the given number of minutes.
pub async fn pause(minutes: u64) {
    tokio::time::sleep(tokio::time::Duration::from_secs(minutes * 60)).await;
}
