use serenity::model::id::UserId;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{
    safe_update, Action, Button, ErrorReport, ErrorReporter, Paginator, PushReceipt,
    SurfaceError, UpdateTarget, ViewError, ViewState, ViewUpdate, EXPIRED, NOT_ALLOWED,
};

/// A paginator bound to the message it controls.
pub struct PaginatorSession {
    paginator: Paginator,
    /// The sent message itself, once known.
    message: Option<Box<dyn UpdateTarget>>,
    /// The most recent interaction response.
    response: Box<dyn UpdateTarget>,
    reporter: Arc<dyn ErrorReporter>,
    timeout: Duration,
    last_activity: Instant,
}

impl PaginatorSession {
    pub fn new(
        paginator: Paginator,
        response: Box<dyn UpdateTarget>,
        reporter: Arc<dyn ErrorReporter>,
        timeout: Duration,
    ) -> Self {
        Self {
            paginator,
            message: None,
            response,
            reporter,
            timeout,
            last_activity: Instant::now(),
        }
    }

    #[cfg(test)]
    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn bind(&mut self, id: String) {
        self.paginator.bind(id);
    }

    pub fn state(&self) -> ViewState {
        self.paginator.state()
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// When the session expires unless something happens first.
    pub fn deadline(&self) -> Instant {
        self.last_activity + self.timeout
    }

    pub fn authorize(&self, actor: UserId) -> Result<(), ViewError> {
        Ok(self.paginator.authorize(actor)?)
    }

    /// The notice `actor` gets instead of having their action run, if any. A session
    /// that ended while the action waited for it counts as expired.
    pub fn refusal(&self, actor: UserId) -> Option<&'static str> {
        if self.is_terminal() {
            Some(EXPIRED)
        } else if self.authorize(actor).is_err() {
            Some(NOT_ALLOWED)
        } else {
            None
        }
    }

    /// Replaces the interaction response used as the fallback target.
    pub fn set_response(&mut self, response: Box<dyn UpdateTarget>) {
        self.response = response;
    }

    fn targets(&self) -> Vec<&dyn UpdateTarget> {
        self.message
            .as_deref()
            .into_iter()
            .chain(std::iter::once(self.response.as_ref()))
            .collect()
    }

    /// Sends the first page.
    pub async fn open(&mut self) -> Result<(), ViewError> {
        let update = self.paginator.render();
        self.push(update, "open").await
    }

    /// Runs one user action to completion.
    pub async fn handle(&mut self, actor: UserId, action: Action) -> Result<(), ViewError> {
        self.paginator.apply(actor, &action)?;
        self.last_activity = Instant::now();

        if action == Action::Press(Button::Stop) {
            return self.close().await;
        }
        let update = self.paginator.render();
        self.push(update, &action.describe()).await
    }

    /// Moves an active session to `Expired` and pushes the disabled controls once.
    /// Returns whether anything was done.
    pub async fn expire(&mut self) -> Result<bool, ViewError> {
        if self.is_terminal() {
            return Ok(false);
        }
        debug!("Paginator timed out");
        self.paginator.expire();
        let update = self.paginator.render_fresh();
        safe_update(&self.targets(), &update, self.reporter.as_ref(), "timeout").await?;
        Ok(true)
    }

    async fn push(&mut self, update: ViewUpdate, action: &str) -> Result<(), ViewError> {
        let result = safe_update(&self.targets(), &update, self.reporter.as_ref(), action).await;
        match result {
            Ok(receipt) => {
                self.remember(&update, &receipt);
                Ok(())
            }
            Err(why) => {
                self.abandon().await;
                Err(why)
            }
        }
    }

    fn remember(&mut self, update: &ViewUpdate, receipt: &PushReceipt) {
        if update.upload.is_some() {
            if let Some(url) = &receipt.image_url {
                self.paginator.cache_attachment(url.clone());
            }
        }
        if self.message.is_none() {
            self.message = self.response.follow(receipt);
        }
    }

    /// After an update failed: stop, and show disabled controls wherever still possible.
    async fn abandon(&mut self) {
        self.paginator.stop();
        let update = self.paginator.render();
        for target in self.targets() {
            if target.push(&update).await.is_ok() {
                return;
            }
        }
        warn!("Could not disable controls of a failed paginator");
    }

    /// Deletes the message, or disables its controls if it cannot be deleted.
    async fn close(&mut self) -> Result<(), ViewError> {
        for target in self.targets() {
            match target.delete().await {
                Ok(()) => return Ok(()),
                Err(SurfaceError::Gone(_)) => continue,
                Err(SurfaceError::Failed(error)) => {
                    self.reporter
                        .report(ErrorReport {
                            action: "stop".to_string(),
                            component: target.describe(),
                            error,
                        })
                        .await;
                    break;
                }
            }
        }

        let update = self.paginator.render();
        safe_update(&self.targets(), &update, self.reporter.as_ref(), "stop").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        page::{Attachment, Page},
        views::{testing::*, PaginatorError},
    };

    fn owner() -> UserId {
        UserId::new(7)
    }

    fn session(pages: Vec<Page>, response: &MockTarget, reporter: &MockReporter) -> PaginatorSession {
        let paginator = Paginator::new(owner(), pages).unwrap();
        PaginatorSession::new(
            paginator,
            Box::new(response.clone()),
            Arc::new(reporter.clone()),
            Duration::from_secs(180),
        )
    }

    fn image_pages() -> Vec<Page> {
        vec![
            Page::new().attachment(Attachment::new("a.png", vec![1u8])),
            Page::new().attachment(Attachment::new("b.png", vec![2u8])),
        ]
    }

    #[tokio::test]
    async fn navigation_edits_in_place() {
        let response = MockTarget::named("response");
        let reporter = MockReporter::default();
        let mut s = session(vec![Page::new(), Page::new()], &response, &reporter);

        s.open().await.unwrap();
        s.handle(owner(), Action::Press(Button::Next)).await.unwrap();

        assert_eq!(response.push_count(), 2);
        let last = response.last().unwrap();
        assert_eq!(last.page.footer_text(), "Page 2/2");
        assert!(last.controls.is_disabled(Button::Next));
        assert!(!last.controls.is_disabled(Button::Previous));
    }

    #[tokio::test]
    async fn revisiting_pages_does_not_reupload() {
        let response = MockTarget::named("response");
        let reporter = MockReporter::default();
        let mut s = session(image_pages(), &response, &reporter);

        s.open().await.unwrap();
        for button in [Button::Next, Button::Previous, Button::Next] {
            s.handle(owner(), Action::Press(button)).await.unwrap();
        }

        assert_eq!(*response.uploads.lock().unwrap(), ["a.png", "b.png"]);
        assert_eq!(
            response.last().unwrap().page.image.as_deref(),
            Some("https://cdn.example/b.png")
        );
    }

    #[tokio::test]
    async fn timeout_reuploads_and_disables_once() {
        let response = MockTarget::named("response");
        let reporter = MockReporter::default();
        let mut s = session(image_pages(), &response, &reporter);

        s.open().await.unwrap();
        assert!(s.expire().await.unwrap());
        assert!(!s.expire().await.unwrap());

        assert_eq!(s.state(), ViewState::Expired);
        assert_eq!(response.push_count(), 2);
        assert_eq!(response.uploads.lock().unwrap().len(), 2);
        assert!(response.last().unwrap().controls.all_disabled());
    }

    #[tokio::test]
    async fn expired_sessions_ignore_actions() {
        let response = MockTarget::named("response");
        let reporter = MockReporter::default();
        let mut s = session(vec![Page::new(), Page::new()], &response, &reporter);
        s.open().await.unwrap();
        s.expire().await.unwrap();

        let err = s.handle(owner(), Action::Press(Button::Next)).await.unwrap_err();

        assert!(matches!(
            err,
            ViewError::Paginator(PaginatorError::Inactive(ViewState::Expired))
        ));
        assert_eq!(response.push_count(), 2);
        assert_eq!(s.paginator().index(), 0);
        assert!(reporter.reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ended_sessions_refuse_before_strangers() {
        let response = MockTarget::named("response");
        let reporter = MockReporter::default();
        let mut s = session(vec![Page::new()], &response, &reporter);
        s.open().await.unwrap();

        assert_eq!(s.refusal(owner()), None);
        assert_eq!(s.refusal(UserId::new(99)), Some(NOT_ALLOWED));

        s.expire().await.unwrap();
        assert_eq!(s.refusal(owner()), Some(EXPIRED));
        assert_eq!(s.refusal(UserId::new(99)), Some(EXPIRED));
    }

    #[tokio::test]
    async fn stop_deletes_the_message() {
        let response = MockTarget::named("response");
        let reporter = MockReporter::default();
        let mut s = session(vec![Page::new()], &response, &reporter);

        s.open().await.unwrap();
        s.handle(owner(), Action::Press(Button::Stop)).await.unwrap();

        assert_eq!(s.state(), ViewState::Stopped);
        assert_eq!(*response.deletes.lock().unwrap(), 1);
        assert_eq!(response.push_count(), 1);
    }

    /// Accepts pushes but refuses to be deleted.
    struct DeleteRefused(MockTarget);

    #[async_trait::async_trait]
    impl UpdateTarget for DeleteRefused {
        fn describe(&self) -> String {
            "message".to_string()
        }

        async fn push(&self, update: &ViewUpdate) -> Result<PushReceipt, SurfaceError> {
            self.0.push(update).await
        }

        async fn delete(&self) -> Result<(), SurfaceError> {
            Err(SurfaceError::Failed("missing permissions".to_string()))
        }
    }

    #[tokio::test]
    async fn undeletable_message_gets_disabled_controls() {
        let response = MockTarget::named("response");
        let reporter = MockReporter::default();
        let mut s = session(vec![Page::new()], &response, &reporter);
        s.open().await.unwrap();
        let message = MockTarget::named("message");
        s.message = Some(Box::new(DeleteRefused(message.clone())));

        s.handle(owner(), Action::Press(Button::Stop)).await.unwrap();

        assert_eq!(s.state(), ViewState::Stopped);
        assert!(message.last().unwrap().controls.all_disabled());
        assert_eq!(reporter.reports.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_update_stops_the_session() {
        let response = MockTarget::named("response");
        let reporter = MockReporter::default();
        let mut s = session(vec![Page::new(), Page::new()], &response, &reporter);
        s.open().await.unwrap();

        *response.fail.lock().unwrap() = Some(SurfaceError::Failed("500".to_string()));
        let err = s.handle(owner(), Action::Press(Button::Next)).await.unwrap_err();

        assert!(matches!(err, ViewError::Update { .. }));
        assert_eq!(s.state(), ViewState::Stopped);
        assert_eq!(reporter.reports.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn strangers_change_nothing() {
        let response = MockTarget::named("response");
        let reporter = MockReporter::default();
        let mut s = session(vec![Page::new(), Page::new()], &response, &reporter);
        s.open().await.unwrap();

        let err = s
            .handle(UserId::new(99), Action::Press(Button::Next))
            .await
            .unwrap_err();

        assert!(matches!(err, ViewError::Paginator(PaginatorError::NotOwner)));
        assert_eq!(s.paginator().index(), 0);
        assert_eq!(response.push_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn actions_push_the_deadline_back() {
        let response = MockTarget::named("response");
        let reporter = MockReporter::default();
        let mut s = session(vec![Page::new(), Page::new()], &response, &reporter);
        let opened = s.deadline();

        tokio::time::advance(Duration::from_secs(100)).await;
        s.handle(owner(), Action::Press(Button::Next)).await.unwrap();

        assert_eq!(s.deadline(), opened + Duration::from_secs(100));
    }
}
