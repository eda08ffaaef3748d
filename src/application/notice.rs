// src/application/notice.rs
//
// User-Facing Notices
//
// Maps AppError into the toast the UI shows plus an optional redirect.
// Internal details are logged, never shown.

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::error::AppError;

pub const MSG_GENERIC_ERROR: &str = "Xəta baş verdi";
pub const MSG_SIGN_IN_REQUIRED: &str = "Giriş etməlisiniz";
pub const MSG_STORY_NOT_FOUND: &str = "Hekayə tapılmadı";
pub const MSG_CHAPTER_NOT_FOUND: &str = "Bölüm tapılmadı";
pub const MSG_USER_NOT_FOUND: &str = "İstifadəçi tapılmadı";
pub const MSG_NO_STORY_PERMISSION: &str = "Bu hekayəni redaktə etmək icazəniz yoxdur";
pub const MSG_NO_CHAPTER_PERMISSION: &str = "Bu bölümü redaktə etmək icazəniz yoxdur";
pub const MSG_LIKE_SIGN_IN: &str = "Bəyənmək üçün daxil olun";
pub const MSG_LIKE_CHAPTERS_INSTEAD: &str = "Bölümləri bəyənə bilərsiniz";
pub const MSG_COMMENT_SIGN_IN: &str = "Şərh yazmaq üçün daxil olun";
pub const MSG_COMMENT_EMPTY: &str = "Şərh boş ola bilməz";
pub const MSG_COMMENT_ADDED: &str = "Şərh əlavə edildi";
pub const MSG_COMMENT_ADD_FAILED: &str = "Şərh əlavə edilərkən xəta baş verdi";
pub const MSG_COMMENT_UPDATED: &str = "Şərh yeniləndi";
pub const MSG_COMMENT_UPDATE_FAILED: &str = "Şərh yenilənərkən xəta baş verdi";
pub const MSG_COMMENT_DELETED: &str = "Şərh silindi";
pub const MSG_COMMENT_DELETE_FAILED: &str = "Şərh silinərkən xəta baş verdi";
pub const MSG_POST_CREATED: &str = "Post uğurla yaradıldı! İndi məzmunu əlavə edə bilərsiniz.";
pub const MSG_POST_DELETED: &str = "Post uğurla silindi";
pub const MSG_POST_DELETE_FAILED: &str = "Post silinərkən xəta baş verdi";
pub const MSG_SAVED: &str = "Uğurla saxlanıldı!";
pub const MSG_PROFILE_UPDATED: &str = "Profil uğurla yeniləndi";
pub const MSG_AVATAR_UPLOADED: &str = "Profil şəkli yükləndi";
pub const MSG_SIGNED_OUT: &str = "Hesabdan çıxış edildi";
pub const MSG_SIGN_OUT_FAILED: &str = "Çıxış zamanı xəta baş verdi";

pub const ROUTE_HOME: &str = "/";
pub const ROUTE_AUTH: &str = "/auth";
pub const ROUTE_PROFILE: &str = "/profile";

pub fn story_route(story_id: uuid::Uuid) -> String {
    format!("/story/{}", story_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

/// A toast plus where to navigate afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub redirect: Option<String>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            redirect: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
            redirect: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            redirect: None,
        }
    }

    pub fn redirect_to(mut self, route: impl Into<String>) -> Self {
        self.redirect = Some(route.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// Messages an action wants for each failure class.
/// Anything not listed falls back to the generic message.
#[derive(Debug, Clone, Default)]
pub struct NoticeMap {
    pub unauthenticated: Option<(&'static str, Option<String>)>,
    pub forbidden: Option<(&'static str, Option<String>)>,
    pub not_found: Option<(&'static str, Option<String>)>,
    /// Shown for backend and storage failures
    pub failure: Option<&'static str>,
}

impl NoticeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unauthenticated(mut self, message: &'static str, redirect: Option<&str>) -> Self {
        self.unauthenticated = Some((message, redirect.map(str::to_string)));
        self
    }

    pub fn forbidden(mut self, message: &'static str, redirect: Option<&str>) -> Self {
        self.forbidden = Some((message, redirect.map(str::to_string)));
        self
    }

    pub fn not_found(mut self, message: &'static str, redirect: Option<&str>) -> Self {
        self.not_found = Some((message, redirect.map(str::to_string)));
        self
    }

    pub fn failure(mut self, message: &'static str) -> Self {
        self.failure = Some(message);
        self
    }

    /// Convert an error into the notice for this action
    pub fn notice(&self, error: &AppError) -> Notice {
        let with = |entry: &Option<(&'static str, Option<String>)>, fallback: &'static str| {
            let (message, redirect) = entry
                .as_ref()
                .map(|(m, r)| (*m, r.clone()))
                .unwrap_or((fallback, None));
            Notice {
                kind: NoticeKind::Error,
                message: message.to_string(),
                redirect,
            }
        };

        match error {
            AppError::Unauthenticated => with(&self.unauthenticated, MSG_SIGN_IN_REQUIRED),
            AppError::Forbidden => with(&self.forbidden, MSG_GENERIC_ERROR),
            AppError::NotFound | AppError::Domain(DomainError::NotFound(_)) => {
                with(&self.not_found, MSG_GENERIC_ERROR)
            }
            AppError::Domain(DomainError::InvariantViolation(reason)) => {
                // validation text is written for users
                Notice::error(reason.clone())
            }
            AppError::Domain(DomainError::Unsupported(_))
            | AppError::Domain(DomainError::InvalidStateTransition(_)) => {
                log::debug!("rejected action: {}", error);
                Notice::error(self.failure.unwrap_or(MSG_GENERIC_ERROR))
            }
            other => {
                log::error!("action failed: {}", other);
                Notice::error(self.failure.unwrap_or(MSG_GENERIC_ERROR))
            }
        }
    }
}

/// Notice for an error with no action-specific wording
pub fn notice_for(error: &AppError) -> Notice {
    NoticeMap::new().notice(error)
}
