mod common;

use std::rc::Rc;

use common::settle;
use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use matinee::config::AdSkipConfig;
use matinee::dismisser::PromptDismisser;
use matinee::net::{Fetch, FetchError, ObservedFetch, Request, Response};
use matinee::page::HostPage;
use tokio::task::LocalSet;
use tokio::time::{sleep, Duration};
use url::Url;

struct StubFetch;

impl Fetch for StubFetch {
    fn fetch(&self, _request: Request) -> LocalBoxFuture<'static, Result<Response, FetchError>> {
        async {
            Ok(Response {
                status: 200,
                body: Vec::new(),
            })
        }
        .boxed_local()
    }
}

fn start_dismisser(
    page: &Rc<HostPage>,
    settle_feed: Option<matinee::net::SettleFeed>,
) -> Rc<PromptDismisser> {
    let dismisser = Rc::new(
        PromptDismisser::new(Rc::clone(page), &AdSkipConfig::default()).expect("valid selectors"),
    );
    dismisser.start(settle_feed);
    dismisser
}

#[tokio::test(start_paused = true)]
async fn visible_skip_control_is_clicked_within_one_debounce_window() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let page = HostPage::from_html("<html><body></body></html>");
            let _dismisser = start_dismisser(&page, None);

            let body = page.body().expect("body");
            let button = page
                .append_html(&body, "<button class=\"adSkipButton skippable\">Skip</button>")
                .expect("append")
                .remove(0);
            page.set_layout_box(&button, 80.0, 32.0);

            sleep(Duration::from_millis(600)).await;
            assert_eq!(page.activation_count(&button), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn zero_size_control_is_never_clicked() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let page = HostPage::from_html("<html><body></body></html>");
            let _dismisser = start_dismisser(&page, None);

            let body = page.body().expect("body");
            let button = page
                .append_html(&body, "<button data-testid=\"skip-ad-button\">Skip</button>")
                .expect("append")
                .remove(0);
            // Present in the DOM but not rendered: no layout box.

            sleep(Duration::from_millis(2000)).await;
            assert_eq!(page.activation_count(&button), 0);
            assert_eq!(page.total_activations(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn network_settle_catches_prompt_shown_without_dom_mutation() {
    let local = LocalSet::new();
    local
        .run_until(async {
            // The prompt node exists from the start; it only becomes visible
            // later, with no child-list change for the watcher to observe.
            let page = HostPage::from_html(
                "<html><body><button class=\"adSkipButton skippable\">Skip</button></body></html>",
            );
            let (fetch, feed) = ObservedFetch::wrap(StubFetch);
            let _dismisser = start_dismisser(&page, Some(feed));
            settle().await;

            let button = page
                .query_first(&matinee::style::compile_selectors(".adSkipButton").expect("sel"))
                .expect("button");
            assert_eq!(page.activation_count(&button), 0);

            page.set_layout_box(&button, 80.0, 32.0);
            sleep(Duration::from_millis(2000)).await;
            // Still nothing: layout changes are not mutations.
            assert_eq!(page.activation_count(&button), 0);

            let url = Url::parse("https://host.example/ad-break").expect("url");
            fetch.fetch(Request::get(url)).await.expect("response");
            settle().await;
            assert_eq!(page.activation_count(&button), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn failed_activation_does_not_abort_the_scan() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let page = HostPage::from_html("<html><body></body></html>");
            let _dismisser = start_dismisser(&page, None);

            let body = page.body().expect("body");
            let broken = page
                .append_html(&body, "<button class=\"adSkipButton skippable\">Skip</button>")
                .expect("append")
                .remove(0);
            let healthy = page
                .append_html(&body, "<button data-testid=\"skip-ad-button\">Skip</button>")
                .expect("append")
                .remove(0);
            page.set_layout_box(&broken, 80.0, 32.0);
            page.set_layout_box(&healthy, 80.0, 32.0);
            page.set_inline_style(&broken, "pointer-events", "none");

            sleep(Duration::from_millis(600)).await;
            // The first pattern's activation failed; the scan still reached
            // the second pattern.
            assert_eq!(page.activation_count(&broken), 0);
            assert_eq!(page.activation_count(&healthy), 1);
        })
        .await;
}
