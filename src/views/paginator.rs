use ahash::AHasher;
use serenity::model::id::UserId;
use std::{collections::HashMap, hash::BuildHasherDefault};
use thiserror::Error;

use super::{Action, Button, Controls, Link, ViewState, ViewUpdate};
use crate::page::Page;

type UrlCache = HashMap<usize, String, BuildHasherDefault<AHasher>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginatorError {
    #[error("There is nothing to show.")]
    Empty,
    #[error("Only the user who opened this menu can use it.")]
    NotOwner,
    #[error("This menu is no longer active.")]
    Inactive(ViewState),
    #[error("The {} button is disabled right now.", .0.as_str())]
    Disabled(Button),
    #[error("There is no category named {0:?}.")]
    UnknownCategory(String),
    #[error("This menu has no categories.")]
    NoCategories,
}

struct Category {
    name: String,
    pages: Vec<Page>,
    /// Server-side URLs of already uploaded attachments, by page index.
    cache: UrlCache,
}

/// Navigation state of one paginated message.
///
/// Holds no I/O: every transition is a plain method, and [`Paginator::render`] produces
/// the [`ViewUpdate`] the session pushes out.
pub struct Paginator {
    owner: UserId,
    categories: Vec<Category>,
    category: usize,
    page: usize,
    footered: bool,
    footer_icon: Option<String>,
    state: ViewState,
    controls: Controls,
}

impl Paginator {
    pub fn new(owner: UserId, pages: Vec<Page>) -> Result<Self, PaginatorError> {
        Self::build(owner, vec![(String::new(), pages)], Controls::navigation())
    }

    /// A two-level paginator: a select menu picks the category, the buttons move inside
    /// it.
    pub fn with_categories(
        owner: UserId,
        categories: Vec<(String, Vec<Page>)>,
    ) -> Result<Self, PaginatorError> {
        let names = categories.iter().map(|(name, _)| name.clone()).collect();
        Self::build(owner, categories, Controls::navigation().with_select(names))
    }

    fn build(
        owner: UserId,
        categories: Vec<(String, Vec<Page>)>,
        controls: Controls,
    ) -> Result<Self, PaginatorError> {
        if categories.is_empty() || categories.iter().any(|(_, pages)| pages.is_empty()) {
            return Err(PaginatorError::Empty);
        }

        let mut paginator = Self {
            owner,
            categories: categories
                .into_iter()
                .map(|(name, pages)| Category {
                    name,
                    pages,
                    cache: UrlCache::default(),
                })
                .collect(),
            category: 0,
            page: 0,
            footered: false,
            footer_icon: None,
            state: ViewState::Active,
            controls,
        };
        paginator.sync_controls();
        Ok(paginator)
    }

    /// Icon used when stamping page numbers into footers.
    pub fn footer_icon(mut self, icon_url: Option<String>) -> Self {
        self.footer_icon = icon_url;
        self
    }

    pub fn links(mut self, links: Vec<Link>) -> Self {
        self.controls = self.controls.with_links(links);
        self
    }

    pub fn bind(&mut self, id: String) {
        self.controls.bind(id);
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    #[cfg(test)]
    pub fn index(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.current().pages.len()
    }

    pub fn category(&self) -> &str {
        &self.current().name
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    #[cfg(test)]
    pub fn is_footered(&self) -> bool {
        self.footered
    }

    fn current(&self) -> &Category {
        &self.categories[self.category]
    }

    fn last_index(&self) -> usize {
        self.page_count() - 1
    }

    pub fn authorize(&self, actor: UserId) -> Result<(), PaginatorError> {
        if actor == self.owner {
            Ok(())
        } else {
            Err(PaginatorError::NotOwner)
        }
    }

    /// Applies one user action. On error nothing changes.
    pub fn apply(&mut self, actor: UserId, action: &Action) -> Result<(), PaginatorError> {
        if self.state.is_terminal() {
            return Err(PaginatorError::Inactive(self.state));
        }
        self.authorize(actor)?;

        match action {
            Action::Press(button) => {
                if self.controls.is_disabled(*button) {
                    return Err(PaginatorError::Disabled(*button));
                }
                match button {
                    Button::First => self.page = 0,
                    Button::Previous => self.page -= 1,
                    Button::Next => self.page += 1,
                    Button::Last => self.page = self.last_index(),
                    Button::Stop => {
                        self.stop();
                        return Ok(());
                    }
                }
            }
            Action::Select(name) => {
                if self.controls.select().is_none() {
                    return Err(PaginatorError::NoCategories);
                }
                let index = self
                    .categories
                    .iter()
                    .position(|c| &c.name == name)
                    .ok_or_else(|| PaginatorError::UnknownCategory(name.clone()))?;
                self.category = index;
                self.page = 0;
                self.controls.set_selected(index);
            }
        }

        self.sync_controls();
        Ok(())
    }

    pub fn stop(&mut self) {
        self.state = ViewState::Stopped;
        self.controls.disable_all();
    }

    pub fn expire(&mut self) {
        if !self.state.is_terminal() {
            self.state = ViewState::Expired;
        }
        self.controls.disable_all();
    }

    fn sync_controls(&mut self) {
        if self.state.is_terminal() {
            self.controls.disable_all();
            return;
        }
        let at_start = self.page == 0;
        let at_end = self.page == self.last_index();
        self.controls.set_disabled(Button::First, at_start);
        self.controls.set_disabled(Button::Previous, at_start);
        self.controls.set_disabled(Button::Stop, false);
        self.controls.set_disabled(Button::Next, at_end);
        self.controls.set_disabled(Button::Last, at_end);
    }

    /// Adds `Page n/N` to every footer, once.
    fn stamp_footers(&mut self) {
        if self.footered {
            return;
        }
        for category in &mut self.categories {
            let total = category.pages.len();
            for (i, page) in category.pages.iter_mut().enumerate() {
                page.add_footer(&format!("Page {}/{}", i + 1, total), self.footer_icon.clone());
            }
        }
        self.footered = true;
    }

    /// The update showing the current page. Attachments already uploaded for this page
    /// are referenced by URL instead of uploaded again.
    pub fn render(&mut self) -> ViewUpdate {
        self.render_with(false)
    }

    /// Like [`Paginator::render`], but always uploads attachments, since cached URLs
    /// may not outlive the interaction they were created for.
    pub fn render_fresh(&mut self) -> ViewUpdate {
        self.render_with(true)
    }

    fn render_with(&mut self, fresh: bool) -> ViewUpdate {
        self.stamp_footers();

        let current = self.current();
        let mut page = current.pages[self.page].clone();
        let attachment = page.attachment.take();
        let upload = match attachment {
            Some(attachment) => match current.cache.get(&self.page) {
                Some(url) if !fresh => {
                    page.image = Some(url.clone());
                    None
                }
                _ => {
                    page.image = Some(attachment.url());
                    Some(attachment)
                }
            },
            None => None,
        };

        ViewUpdate {
            page,
            upload,
            controls: self.controls.clone(),
        }
    }

    /// Remembers where the current page's attachment ended up.
    pub fn cache_attachment(&mut self, url: String) {
        let page = self.page;
        let category = &mut self.categories[self.category];
        if category.pages[page].attachment.is_some() {
            category.cache.insert(page, url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Attachment;

    fn owner() -> UserId {
        UserId::new(1)
    }

    fn pages(n: usize) -> Vec<Page> {
        (1..=n).map(|i| Page::new().title(format!("page {}", i))).collect()
    }

    fn press(p: &mut Paginator, button: Button) -> Result<(), PaginatorError> {
        p.apply(owner(), &Action::Press(button))
    }

    fn assert_bounds(p: &Paginator) {
        let c = p.controls();
        let last = p.page_count() - 1;
        assert!(p.index() <= last);
        assert_eq!(c.is_disabled(Button::First), p.index() == 0);
        assert_eq!(c.is_disabled(Button::Previous), p.index() == 0);
        assert_eq!(c.is_disabled(Button::Next), p.index() == last);
        assert_eq!(c.is_disabled(Button::Last), p.index() == last);
        assert!(!c.is_disabled(Button::Stop));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            Paginator::new(owner(), Vec::new()),
            Err(PaginatorError::Empty)
        ));
        assert!(matches!(
            Paginator::with_categories(owner(), vec![("A".to_string(), Vec::new())]),
            Err(PaginatorError::Empty)
        ));
        assert!(matches!(
            Paginator::with_categories(owner(), Vec::new()),
            Err(PaginatorError::Empty)
        ));
    }

    #[test]
    fn single_page_disables_all_navigation() {
        let p = Paginator::new(owner(), pages(1)).unwrap();
        for button in [Button::First, Button::Previous, Button::Next, Button::Last] {
            assert!(p.controls().is_disabled(button));
        }
        assert!(!p.controls().is_disabled(Button::Stop));
    }

    #[test]
    fn controls_track_bounds_through_every_move() {
        for n in 1..=5 {
            let mut p = Paginator::new(owner(), pages(n)).unwrap();
            assert_bounds(&p);
            for button in [
                Button::Next,
                Button::Last,
                Button::Previous,
                Button::First,
                Button::Next,
                Button::Next,
            ] {
                let _ = press(&mut p, button);
                assert_bounds(&p);
            }
        }
    }

    #[test]
    fn next_and_previous_move_one_step() {
        let mut p = Paginator::new(owner(), pages(3)).unwrap();
        press(&mut p, Button::Next).unwrap();
        assert_eq!(p.index(), 1);
        press(&mut p, Button::Last).unwrap();
        assert_eq!(p.index(), 2);
        press(&mut p, Button::Previous).unwrap();
        assert_eq!(p.index(), 1);
        press(&mut p, Button::First).unwrap();
        assert_eq!(p.index(), 0);
    }

    #[test]
    fn disabled_controls_are_rejected_without_change() {
        let mut p = Paginator::new(owner(), pages(2)).unwrap();
        assert_eq!(
            press(&mut p, Button::Previous),
            Err(PaginatorError::Disabled(Button::Previous))
        );
        press(&mut p, Button::Last).unwrap();
        assert_eq!(
            press(&mut p, Button::Next),
            Err(PaginatorError::Disabled(Button::Next))
        );
        assert_eq!(p.index(), 1);
    }

    #[test]
    fn other_users_cannot_navigate() {
        let mut p = Paginator::new(owner(), pages(3)).unwrap();
        let before = p.controls().clone();
        assert_eq!(
            p.apply(UserId::new(2), &Action::Press(Button::Next)),
            Err(PaginatorError::NotOwner)
        );
        assert_eq!(p.index(), 0);
        assert_eq!(*p.controls(), before);
        assert_eq!(p.state(), ViewState::Active);
    }

    #[test]
    fn footers_are_stamped_once() {
        let pages = vec![
            Page::new().footer("tip", None),
            Page::new().footer("tip", None),
        ];
        let mut p = Paginator::new(owner(), pages).unwrap();
        assert!(!p.is_footered());

        let first = p.render();
        assert_eq!(first.page.footer_text(), "Page 1/2 | tip");
        press(&mut p, Button::Next).unwrap();
        assert_eq!(p.render().page.footer_text(), "Page 2/2 | tip");
        press(&mut p, Button::First).unwrap();
        assert_eq!(p.render().page.footer_text(), "Page 1/2 | tip");
        assert!(p.is_footered());
    }

    #[test]
    fn categories_are_stamped_with_their_own_totals() {
        let mut p = Paginator::with_categories(
            owner(),
            vec![("Home".to_string(), pages(1)), ("Utility".to_string(), pages(3))],
        )
        .unwrap();
        p.render();
        p.apply(owner(), &Action::Select("Utility".to_string())).unwrap();
        assert_eq!(p.render().page.footer_text(), "Page 1/3");
    }

    #[test]
    fn selecting_a_category_resets_the_index() {
        let mut p = Paginator::with_categories(
            owner(),
            vec![("Home".to_string(), pages(3)), ("Utility".to_string(), pages(2))],
        )
        .unwrap();
        press(&mut p, Button::Last).unwrap();
        assert_eq!(p.index(), 2);

        p.apply(owner(), &Action::Select("Utility".to_string())).unwrap();

        assert_eq!(p.category(), "Utility");
        assert_eq!(p.index(), 0);
        assert_eq!(p.page_count(), 2);
        assert_eq!(p.controls().select().map(|s| s.selected), Some(1));
        assert_bounds(&p);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut p =
            Paginator::with_categories(owner(), vec![("Home".to_string(), pages(1))]).unwrap();
        assert_eq!(
            p.apply(owner(), &Action::Select("Nope".to_string())),
            Err(PaginatorError::UnknownCategory("Nope".to_string()))
        );
    }

    #[test]
    fn flat_paginator_has_no_categories() {
        let mut p = Paginator::new(owner(), pages(2)).unwrap();
        assert_eq!(
            p.apply(owner(), &Action::Select("Home".to_string())),
            Err(PaginatorError::NoCategories)
        );
    }

    #[test]
    fn attachments_upload_once_per_page() {
        let pages = vec![
            Page::new().attachment(Attachment::new("a.png", vec![1u8])),
            Page::new().attachment(Attachment::new("b.png", vec![2u8])),
        ];
        let mut p = Paginator::new(owner(), pages).unwrap();
        let mut uploads = 0;

        for button in [Button::Next, Button::Previous, Button::Next, Button::Previous] {
            let update = p.render();
            if let Some(attachment) = update.upload {
                uploads += 1;
                assert_eq!(update.page.image, Some(attachment.url()));
                p.cache_attachment(format!("https://cdn.example/{}", attachment.filename));
            } else {
                assert!(update.page.image.unwrap().starts_with("https://cdn.example/"));
            }
            press(&mut p, button).unwrap();
        }

        assert_eq!(uploads, 2);
    }

    #[test]
    fn fresh_render_uploads_even_when_cached() {
        let pages = vec![Page::new().attachment(Attachment::new("a.png", vec![1u8]))];
        let mut p = Paginator::new(owner(), pages).unwrap();
        p.render();
        p.cache_attachment("https://cdn.example/a.png".to_string());
        assert!(p.render().upload.is_none());

        let update = p.render_fresh();
        assert_eq!(update.upload.map(|a| a.filename), Some("a.png".to_string()));
    }

    #[test]
    fn pages_without_attachments_are_not_cached() {
        let mut p = Paginator::new(owner(), pages(1)).unwrap();
        p.cache_attachment("https://cdn.example/x.png".to_string());
        assert_eq!(p.render().page.image, None);
    }

    #[test]
    fn stop_is_terminal() {
        let mut p = Paginator::new(owner(), pages(3)).unwrap();
        press(&mut p, Button::Stop).unwrap();
        assert_eq!(p.state(), ViewState::Stopped);
        assert!(p.controls().all_disabled());
        assert_eq!(
            press(&mut p, Button::Next),
            Err(PaginatorError::Inactive(ViewState::Stopped))
        );
    }

    #[test]
    fn expiry_disables_everything_and_keeps_stopped() {
        let mut p = Paginator::with_categories(owner(), vec![("Home".to_string(), pages(2))])
            .unwrap();
        p.expire();
        assert_eq!(p.state(), ViewState::Expired);
        assert!(p.controls().all_disabled());
        assert!(p.render().controls.all_disabled());

        let mut stopped = Paginator::new(owner(), pages(2)).unwrap();
        stopped.stop();
        stopped.expire();
        assert_eq!(stopped.state(), ViewState::Stopped);
    }
}
