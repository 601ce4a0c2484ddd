//! Notice board for transient user-facing messages.
//!
//! One board is created at startup and shared by `Arc`. Surfaces push notices, readers
//! subscribe to a watch channel, and dropping the board closes every subscription. Notices are
//! newest first and capped at the configured limit.

use crate::WardError;
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Notice {
    pub id: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub level: NoticeLevel,
    /// False once dismissed; the notice stays listed until removed.
    pub open: bool,
}

#[derive(Debug, Default)]
struct BoardState {
    next_id: u64,
    notices: Vec<Notice>,
}

#[derive(Debug)]
pub struct NoticeBoard {
    limit: usize,
    state: Mutex<BoardState>,
    snapshot: watch::Sender<Vec<Notice>>,
}

impl NoticeBoard {
    pub fn new(limit: usize) -> Self {
        let (snapshot, _) = watch::channel(Vec::new());
        Self {
            limit: limit.max(1),
            state: Mutex::new(BoardState::default()),
            snapshot,
        }
    }

    /// Apply `change` and publish the new list if it reports a modification.
    fn mutate<R>(&self, change: impl FnOnce(&mut BoardState) -> (bool, R)) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (modified, result) = change(&mut state);
        if modified {
            self.snapshot.send_replace(state.notices.clone());
        }
        result
    }

    /// Add a notice at the top of the board and return its id.
    pub fn push(
        &self,
        title: impl Into<String>,
        description: Option<String>,
        level: NoticeLevel,
    ) -> u64 {
        let title = title.into();
        let limit = self.limit;
        self.mutate(|state| {
            state.next_id += 1;
            let id = state.next_id;
            state.notices.insert(
                0,
                Notice {
                    id,
                    title,
                    description,
                    level,
                    open: true,
                },
            );
            state.notices.truncate(limit);
            (true, id)
        })
    }

    /// Edit a notice in place. Returns false when it is no longer on the board.
    pub fn update(&self, id: u64, edit: impl FnOnce(&mut Notice)) -> bool {
        self.mutate(|state| match state.notices.iter_mut().find(|n| n.id == id) {
            Some(notice) => {
                edit(notice);
                notice.id = id;
                (true, true)
            }
            None => (false, false),
        })
    }

    /// Close one notice, or every notice when `id` is `None`.
    pub fn dismiss(&self, id: Option<u64>) -> bool {
        self.mutate(|state| {
            let mut changed = false;
            for notice in state.notices.iter_mut() {
                if notice.open && id.map_or(true, |id| notice.id == id) {
                    notice.open = false;
                    changed = true;
                }
            }
            (changed, changed)
        })
    }

    /// Delete one notice, or clear the board when `id` is `None`.
    pub fn remove(&self, id: Option<u64>) -> bool {
        self.mutate(|state| {
            let before = state.notices.len();
            match id {
                Some(id) => state.notices.retain(|n| n.id != id),
                None => state.notices.clear(),
            }
            let changed = state.notices.len() != before;
            (changed, changed)
        })
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Notice>> {
        self.snapshot.subscribe()
    }

    /// Log a failure with its context and post the friendly message.
    pub fn report(&self, context: &str, error: &WardError) -> u64 {
        tracing::error!("{}: {}", context, error);
        self.push(error.user_message(), None, NoticeLevel::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first_and_capped() {
        let board = NoticeBoard::new(2);
        board.push("a", None, NoticeLevel::Info);
        board.push("b", None, NoticeLevel::Info);
        let c = board.push("c", Some("detail".into()), NoticeLevel::Success);

        let notices = board.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].id, c);
        assert_eq!(notices[0].title, "c");
        assert_eq!(notices[1].title, "b");
    }

    #[test]
    fn default_limit_keeps_one() {
        let board = NoticeBoard::new(crate::constants::DEFAULT_NOTICE_LIMIT);
        board.push("a", None, NoticeLevel::Info);
        board.push("b", None, NoticeLevel::Info);
        assert_eq!(board.notices().len(), 1);
    }

    #[test]
    fn update_dismiss_and_remove() {
        let board = NoticeBoard::new(3);
        let a = board.push("a", None, NoticeLevel::Info);
        let b = board.push("b", None, NoticeLevel::Info);

        assert!(board.update(a, |n| n.title = "a2".into()));
        assert!(!board.update(99, |n| n.title = "x".into()));
        assert_eq!(board.notices()[1].title, "a2");

        assert!(board.dismiss(Some(b)));
        assert!(!board.dismiss(Some(b)));
        assert!(!board.notices()[0].open);
        assert!(board.notices()[1].open);

        assert!(board.dismiss(None));
        assert!(board.notices().iter().all(|n| !n.open));

        assert!(board.remove(Some(a)));
        assert_eq!(board.notices().len(), 1);
        assert!(board.remove(None));
        assert!(board.notices().is_empty());
        assert!(!board.remove(None));
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let board = NoticeBoard::new(1);
        let mut rx = board.subscribe();

        let err = WardError::Unauthorized {
            status: 401,
            message: "JWT expired".into(),
        };
        board.report("fetch_dashboard_stats", &err);

        rx.changed().await.unwrap();
        let notices = rx.borrow_and_update().clone();
        assert_eq!(notices[0].title, "Sessão expirada. Faça login novamente.");
        assert_eq!(notices[0].level, NoticeLevel::Error);

        drop(board);
        assert!(rx.changed().await.is_err());
    }
}
