#![allow(dead_code)]

use std::rc::Rc;

use matinee::page::HostPage;
use tokio::time::{sleep, Duration};

pub const PLAYER_PAGE: &str = r#"<html><body>
<div class="webPlayerUIContainer"><video></video></div>
</body></html>"#;

pub fn player_page() -> Rc<HostPage> {
    HostPage::from_html(PLAYER_PAGE)
}

/// Lets pending tasks run and queued mutation batches deliver without
/// crossing any configured timing window (the test clock is paused, so this
/// advances virtual time by a single millisecond).
pub async fn settle() {
    sleep(Duration::from_millis(1)).await;
}
