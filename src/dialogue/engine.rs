//! The per-user dialogue engine.
//!
//! Routes each inbound event through the session state machine: free text
//! goes to the pending step when one exists, button taps dispatch by their
//! parsed intent, and navigation errors fall back to the nearest valid
//! parent view. All handling for one user runs under that user's session
//! mutex, so concurrent turns for the same user serialize while other
//! users proceed untouched.

use std::sync::Arc;

use crate::error::NotFound;
use crate::event::{ButtonAction, Event, Program, UserRef};
use crate::intake::{ApplicationRecord, IntakeGateway};
use crate::nav::{Navigator, Reply};
use crate::normalize::Normalizer;
use crate::search::search;

use super::phone::normalize_phone;
use super::session::{Session, SessionStore};
use super::state::PendingStep;

/// Gateway failures tolerated before the draft is discarded: the first
/// failure keeps the draft for one user-triggered retry.
const MAX_SUBMIT_ATTEMPTS: u32 = 2;

pub struct DialogueEngine {
    navigator: Navigator,
    normalizer: Normalizer,
    sessions: Arc<SessionStore>,
    gateway: Arc<dyn IntakeGateway>,
    phone_max_attempts: u32,
}

impl DialogueEngine {
    pub fn new(
        navigator: Navigator,
        sessions: Arc<SessionStore>,
        gateway: Arc<dyn IntakeGateway>,
        phone_max_attempts: u32,
    ) -> Self {
        Self {
            navigator,
            normalizer: Normalizer::russian(),
            sessions,
            gateway,
            phone_max_attempts,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one inbound event. `None` means the event was dropped
    /// (malformed or stale) and nothing should be sent.
    pub async fn handle(&self, event: Event) -> Option<Reply> {
        let user = event.user().clone();
        let session = self.sessions.get_or_create(&user.id).await;
        let mut session = session.lock().await;
        session.touch();

        match event {
            Event::Command { name, .. } => Some(self.on_command(&mut session, &user, &name)),
            Event::ButtonTap { token, .. } => self.on_button(&mut session, &user, &token).await,
            Event::FreeText { content, .. } => {
                Some(self.on_free_text(&mut session, &user, &content).await)
            }
        }
    }

    fn on_command(&self, session: &mut Session, user: &UserRef, name: &str) -> Reply {
        if name != "/start" {
            tracing::debug!(user = %user.id, command = name, "Unknown command, showing menu");
        }
        session.reset();
        let mut reply = self.navigator.root_menu();
        reply.text = format!("Здравствуйте! Я помогу найти ответы на вопросы.\n\n{}", reply.text);
        reply
    }

    async fn on_button(
        &self,
        session: &mut Session,
        user: &UserRef,
        token: &str,
    ) -> Option<Reply> {
        let Some(action) = ButtonAction::parse(token) else {
            tracing::warn!(user = %user.id, token, "Malformed button token, ignoring");
            return None;
        };

        // Program buttons are only meaningful at the final step.
        if let ButtonAction::Program(program) = action {
            if session.step != PendingStep::AwaitingProgram {
                tracing::warn!(
                    user = %user.id,
                    step = %session.step,
                    "Stale program tap, ignoring"
                );
                return None;
            }
            return Some(self.submit(session, user, program).await);
        }

        // Any other tap abandons whatever was pending: buttons are never
        // "the keyword" and navigating away cancels a half-done flow.
        if session.step.is_pending() {
            tracing::debug!(user = %user.id, step = %session.step, "Button tap cleared pending step");
            session.reset();
        }

        Some(match action {
            ButtonAction::Category(i) => self.category_or_root(user, i),
            ButtonAction::Subcategory(i, j) => match self.navigator.subcategory_menu(i, j) {
                Ok(reply) => reply,
                Err(e) => {
                    self.log_fallback(user, &e);
                    self.category_or_root(user, i)
                }
            },
            ButtonAction::Question(id) => match self.navigator.question_view(id) {
                Ok(reply) => reply,
                Err(e) => {
                    self.log_fallback(user, &e);
                    let mut reply = self.navigator.root_menu();
                    reply.text = format!("Вопрос не найден.\n\n{}", reply.text);
                    reply
                }
            },
            ButtonAction::BackToCategories => self.navigator.root_menu(),
            ButtonAction::BackToSubcategories(i) => self.category_or_root(user, i),
            ButtonAction::Search => {
                session.step = PendingStep::AwaitingKeyword;
                Reply::text_only("Введите ключевое слово для поиска:")
            }
            ButtonAction::Apply => self.start_application(session, user),
            ButtonAction::Program(_) => unreachable!("handled above"),
        })
    }

    async fn on_free_text(&self, session: &mut Session, user: &UserRef, content: &str) -> Reply {
        let text = content.trim();
        match session.step {
            PendingStep::AwaitingKeyword => {
                if text.is_empty() {
                    // An empty keyword is rejected rather than treated as
                    // match-everything.
                    return Reply::text_only("Запрос пуст. Введите ключевое слово:");
                }
                session.step = PendingStep::Idle;
                let hits = search(self.navigator.tree(), &self.normalizer, text);
                tracing::info!(user = %user.id, query = text, hits = hits.len(), "Search");
                self.navigator.search_results(&hits)
            }
            PendingStep::AwaitingUsername => {
                if text.is_empty() {
                    return Reply::text_only("Ник не может быть пустым. Укажите ваш ник в Telegram:");
                }
                session.draft.telegram_handle = Some(text.to_string());
                session.step = PendingStep::AwaitingFullName;
                Reply::text_only("Введите ваше ФИО:")
            }
            PendingStep::AwaitingFullName => {
                if text.is_empty() {
                    return Reply::text_only("ФИО не может быть пустым. Введите ваше ФИО:");
                }
                session.draft.fio = Some(text.to_string());
                session.step = PendingStep::AwaitingPhone;
                Reply::text_only("Введите ваш номер телефона:")
            }
            PendingStep::AwaitingPhone => match normalize_phone(text) {
                Ok(phone) => {
                    session.draft.phone = Some(phone);
                    session.draft.phone_attempts = 0;
                    session.step = PendingStep::AwaitingProgram;
                    self.navigator.program_menu()
                }
                Err(e) => {
                    session.draft.phone_attempts += 1;
                    tracing::debug!(
                        user = %user.id,
                        attempt = session.draft.phone_attempts,
                        error = %e,
                        "Phone validation failed"
                    );
                    if session.draft.phone_attempts >= self.phone_max_attempts {
                        session.reset();
                        let mut reply = self.navigator.root_menu();
                        reply.text = format!(
                            "Не удалось распознать номер. Попробуйте оформить заявку позже.\n\n{}",
                            reply.text
                        );
                        return reply;
                    }
                    Reply::text_only(
                        "Номер должен начинаться с 7 или 8. Введите ваш номер телефона:",
                    )
                }
            },
            PendingStep::AwaitingProgram => {
                let mut reply = self.navigator.program_menu();
                reply.text = format!("Пожалуйста, выберите программу кнопкой.\n\n{}", reply.text);
                reply
            }
            PendingStep::Idle => {
                let mut reply = self.navigator.root_menu();
                reply.text = format!(
                    "Я понимаю кнопки и поиск по ключевому слову.\n\n{}",
                    reply.text
                );
                reply
            }
        }
    }

    fn start_application(&self, session: &mut Session, user: &UserRef) -> Reply {
        session.reset();
        match user.username.as_deref() {
            // A known handle skips the username step.
            Some(username) => {
                session.draft.telegram_handle = Some(format!("@{username}"));
                session.step = PendingStep::AwaitingFullName;
                Reply::text_only("Введите ваше ФИО:")
            }
            None => {
                session.step = PendingStep::AwaitingUsername;
                Reply::text_only("Укажите ваш ник в Telegram:")
            }
        }
    }

    async fn submit(&self, session: &mut Session, user: &UserRef, program: Program) -> Reply {
        session.draft.program = Some(program.as_str().to_string());

        let draft = &session.draft;
        let (Some(handle), Some(fio), Some(phone), Some(program)) = (
            draft.telegram_handle.clone(),
            draft.fio.clone(),
            draft.phone.clone(),
            draft.program.clone(),
        ) else {
            tracing::error!(user = %user.id, "Program selected with incomplete draft");
            session.reset();
            let mut reply = self.navigator.root_menu();
            reply.text = format!("Заявка потеряна, начните заново.\n\n{}", reply.text);
            return reply;
        };

        let record = ApplicationRecord {
            telegram_id: handle,
            fio,
            phone,
            program,
        };

        match self.gateway.submit(&record).await {
            Ok(()) => {
                tracing::info!(user = %user.id, "Application submitted");
                session.reset();
                let mut reply = self.navigator.root_menu();
                reply.text = format!(
                    "✅ Заявка отправлена! Мы свяжемся с вами.\n\n{}",
                    reply.text
                );
                reply
            }
            Err(e) => {
                session.draft.submit_attempts += 1;
                tracing::error!(
                    user = %user.id,
                    attempt = session.draft.submit_attempts,
                    error = %e,
                    "Application submission failed"
                );
                if session.draft.submit_attempts >= MAX_SUBMIT_ATTEMPTS {
                    session.reset();
                    let mut reply = self.navigator.root_menu();
                    reply.text = format!(
                        "Не удалось отправить заявку. Попробуйте позже.\n\n{}",
                        reply.text
                    );
                    reply
                } else {
                    // Draft is kept; the user may tap a program button once
                    // more to retry.
                    let mut reply = self.navigator.program_menu();
                    reply.text = format!(
                        "Не удалось отправить заявку. Нажмите кнопку программы, чтобы повторить.\n\n{}",
                        reply.text
                    );
                    reply
                }
            }
        }
    }

    fn category_or_root(&self, user: &UserRef, i: usize) -> Reply {
        match self.navigator.category_menu(i) {
            Ok(reply) => reply,
            Err(e) => {
                self.log_fallback(user, &e);
                self.navigator.root_menu()
            }
        }
    }

    fn log_fallback(&self, user: &UserRef, e: &NotFound) {
        tracing::warn!(user = %user.id, error = %e, "Navigation target missing, falling back");
    }
}
