//! The respond → observe → correct cycle.
//!
//! Each user turn gets a persona reply built from an instructions snapshot
//! taken when the turn starts. The observer then reviews the recent
//! transcript; if its feedback mentions a problem the corrector rewrites the
//! instructions, and the rewrite is swapped in for all later turns. Observer
//! and corrector failures never affect the reply.

use std::sync::Arc;

use reframe_core::{LlmProvider, PersonaInstructions, ReframeError, SearchProvider, Speaker};
use reframe_logging::{TurnEvent, TurnEventLogger};
use tracing::{error, info, instrument, warn};

use crate::context_window::ContextWindow;
use crate::corrector::{validate_instructions, PromptCorrector};
use crate::heuristics::{problem_detected, KeywordSet};
use crate::observer::QualityObserver;
use crate::persona::{PersonaResponder, SearchTrace};
use crate::session_state::{Conversation, LoopState};
use crate::settings::LoopSettings;

/// Sent instead of a reply when the persona stage fails.
pub const APOLOGY: &str =
    "Извините, произошла ошибка при обработке вашего запроса. Пожалуйста, попробуйте еще раз.";

/// Sent after the instructions have been rewritten.
pub const CORRECTION_NOTICE: &str = "⚠️ Обнаружены проблемы в ответах. Промпт психолога обновлён.";

/// Observer feedback plus the keyword verdict derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverVerdict {
    pub feedback: String,
    pub problem_detected: bool,
}

/// What happened to the instructions during review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correction {
    /// No problem reported, or the observer failed.
    NotAttempted,
    Applied { generation: u64 },
    /// The corrector answered with unusable text.
    Rejected { reason: String },
    /// The corrector call itself failed.
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct PersonaReply {
    pub text: String,
    /// False when `text` is the apology and nothing was recorded.
    pub recorded: bool,
    /// Instructions generation the reply was produced under.
    pub generation: u64,
    pub searches: Vec<SearchTrace>,
}

#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub verdict: Option<ObserverVerdict>,
    pub correction: Correction,
}

impl ReviewOutcome {
    /// The user-facing notice, if the instructions changed.
    pub fn notice(&self) -> Option<&'static str> {
        matches!(self.correction, Correction::Applied { .. }).then_some(CORRECTION_NOTICE)
    }
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub notice: Option<String>,
    pub verdict: Option<ObserverVerdict>,
}

pub struct FeedbackLoop {
    persona: PersonaResponder,
    observer: QualityObserver,
    corrector: PromptCorrector,
    instructions: PersonaInstructions,
    persona_window: usize,
    observer_window: usize,
    min_instruction_chars: usize,
    problem_triggers: KeywordSet,
}

impl FeedbackLoop {
    pub fn new(
        persona: PersonaResponder,
        observer: QualityObserver,
        corrector: PromptCorrector,
        instructions: PersonaInstructions,
        settings: &LoopSettings,
    ) -> Self {
        Self {
            persona,
            observer,
            corrector,
            instructions,
            persona_window: settings.persona_window,
            observer_window: settings.observer_window,
            min_instruction_chars: settings.min_instruction_chars,
            problem_triggers: settings.problem_triggers.clone(),
        }
    }

    /// All three stages share one model provider; instructions start from
    /// `settings.initial_instructions`.
    pub fn with_provider(
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        settings: &LoopSettings,
    ) -> Self {
        Self::new(
            PersonaResponder::new(llm.clone(), search, settings),
            QualityObserver::new(llm.clone(), settings),
            PromptCorrector::new(llm, settings),
            PersonaInstructions::new(settings.initial_instructions.clone()),
            settings,
        )
    }

    pub fn instructions(&self) -> &PersonaInstructions {
        &self.instructions
    }

    /// Record the user's message and produce the persona reply.
    #[instrument(skip_all, fields(user_id = conversation.user_id()))]
    pub async fn respond(&self, conversation: &mut Conversation, user_text: &str) -> PersonaReply {
        let user_id = conversation.user_id();
        conversation.enter(LoopState::AwaitingPersonaReply);

        let snapshot = self.instructions.snapshot();
        let preceding = conversation.turns().len();
        conversation.record(Speaker::User, user_text);
        TurnEventLogger::log_event(
            user_id,
            TurnEvent::Message {
                role: Speaker::User.to_string(),
                content: user_text.to_string(),
            },
        );

        let window = ContextWindow::build(&conversation.turns()[..preceding], self.persona_window);
        let result = self.persona.respond(&snapshot.text, window.turns, user_text).await;

        let reply = match result {
            Ok(answer) => {
                for search in &answer.searches {
                    TurnEventLogger::log_event(
                        user_id,
                        TurnEvent::SearchPerformed {
                            query: search.query.clone(),
                            hits: search.hits,
                        },
                    );
                }
                conversation.record(Speaker::Persona, answer.text.clone());
                TurnEventLogger::log_event(
                    user_id,
                    TurnEvent::Message {
                        role: Speaker::Persona.to_string(),
                        content: answer.text.clone(),
                    },
                );
                info!(generation = snapshot.generation, "Persona replied");
                PersonaReply {
                    text: answer.text,
                    recorded: true,
                    generation: snapshot.generation,
                    searches: answer.searches,
                }
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "Persona stage failed, sending apology");
                log_stage_failure(user_id, "persona", &e);
                PersonaReply {
                    text: APOLOGY.to_string(),
                    recorded: false,
                    generation: snapshot.generation,
                    searches: Vec::new(),
                }
            }
        };

        conversation.enter(LoopState::Idle);
        reply
    }

    /// Review the recent transcript and correct the instructions if needed.
    #[instrument(skip_all, fields(user_id = conversation.user_id()))]
    pub async fn review(&self, conversation: &mut Conversation) -> ReviewOutcome {
        let user_id = conversation.user_id();
        conversation.enter(LoopState::AwaitingObserverVerdict);

        let dialogue = ContextWindow::build(conversation.turns(), self.observer_window).render();
        let feedback = match self.observer.review(&dialogue).await {
            Ok(feedback) => feedback,
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Observer failed, skipping review");
                log_stage_failure(user_id, "observer", &e);
                conversation.enter(LoopState::Idle);
                return ReviewOutcome {
                    verdict: None,
                    correction: Correction::NotAttempted,
                };
            }
        };

        let verdict = ObserverVerdict {
            problem_detected: problem_detected(&self.problem_triggers, &feedback),
            feedback,
        };
        TurnEventLogger::log_event(
            user_id,
            TurnEvent::Verdict {
                problem_detected: verdict.problem_detected,
                feedback_chars: verdict.feedback.chars().count(),
            },
        );

        if !verdict.problem_detected {
            conversation.enter(LoopState::Idle);
            return ReviewOutcome {
                verdict: Some(verdict),
                correction: Correction::NotAttempted,
            };
        }

        conversation.enter(LoopState::Correcting);
        let correction = self.correct(user_id, &verdict.feedback).await;
        conversation.enter(LoopState::Idle);

        ReviewOutcome {
            verdict: Some(verdict),
            correction,
        }
    }

    /// Respond, then review. The reply is returned even if review fails.
    pub async fn handle_turn(&self, conversation: &mut Conversation, user_text: &str) -> TurnOutcome {
        let reply = self.respond(conversation, user_text).await;
        if !reply.recorded {
            return TurnOutcome {
                reply: reply.text,
                notice: None,
                verdict: None,
            };
        }

        let review = self.review(conversation).await;
        TurnOutcome {
            reply: reply.text,
            notice: review.notice().map(str::to_string),
            verdict: review.verdict,
        }
    }

    async fn correct(&self, user_id: i64, feedback: &str) -> Correction {
        let current = self.instructions.snapshot();
        let raw = match self.corrector.rewrite(&current.text, feedback).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Corrector failed, keeping instructions");
                log_stage_failure(user_id, "corrector", &e);
                return Correction::Failed {
                    reason: e.to_string(),
                };
            }
        };

        match validate_instructions(&raw, self.min_instruction_chars) {
            Ok(text) => {
                let chars = text.chars().count();
                let generation = self.instructions.replace(text);
                TurnEventLogger::log_event(
                    user_id,
                    TurnEvent::CorrectionApplied {
                        generation,
                        instruction_chars: chars,
                    },
                );
                Correction::Applied { generation }
            }
            Err(e) => {
                warn!(error = %e, "Rejected corrector output");
                TurnEventLogger::log_event(
                    user_id,
                    TurnEvent::CorrectionRejected {
                        reason: e.to_string(),
                    },
                );
                Correction::Rejected {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn log_stage_failure(user_id: i64, stage: &str, error: &ReframeError) {
    TurnEventLogger::log_event(
        user_id,
        TurnEvent::StageFailed {
            stage: stage.to_string(),
            error_kind: error.kind().to_string(),
            error_msg: error.to_string(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reframe_core::{LlmRequest, LlmResponse};
    use reframe_planner::{MockProvider, MockReply};
    use reframe_tools::MockSearchProvider;

    const I0: &str = "Вы - психолог-консультант. Будьте внимательны к клиенту.";
    const REWRITE: &str = "Вы - психолог-консультант. Проявляйте больше эмпатии и задавайте уточняющие вопросы.";

    struct Harness {
        persona: Arc<MockProvider>,
        observer: Arc<MockProvider>,
        corrector: Arc<MockProvider>,
        search: Arc<MockSearchProvider>,
        feedback_loop: FeedbackLoop,
    }

    fn harness(persona: MockProvider, observer: MockProvider, corrector: MockProvider) -> Harness {
        harness_with_search(persona, observer, corrector, MockSearchProvider::new())
    }

    fn harness_with_search(
        persona: MockProvider,
        observer: MockProvider,
        corrector: MockProvider,
        search: MockSearchProvider,
    ) -> Harness {
        let settings = LoopSettings::default();
        let persona = Arc::new(persona);
        let observer = Arc::new(observer);
        let corrector = Arc::new(corrector);
        let search = Arc::new(search);
        let feedback_loop = FeedbackLoop::new(
            PersonaResponder::new(persona.clone(), search.clone(), &settings),
            QualityObserver::new(observer.clone(), &settings),
            PromptCorrector::new(corrector.clone(), &settings),
            PersonaInstructions::new(I0),
            &settings,
        );
        Harness {
            persona,
            observer,
            corrector,
            search,
            feedback_loop,
        }
    }

    #[tokio::test]
    async fn greeting_without_problems_keeps_instructions() {
        let h = harness(
            MockProvider::new("persona").with_response("Здравствуйте! Что вас беспокоит?"),
            MockProvider::new("observer").with_response("Психолог вежлив и внимателен."),
            MockProvider::new("corrector").with_response(REWRITE),
        );
        let mut conversation = Conversation::new(1);

        let outcome = h.feedback_loop.handle_turn(&mut conversation, "Здравствуйте").await;

        assert_eq!(outcome.reply, "Здравствуйте! Что вас беспокоит?");
        assert!(outcome.notice.is_none());
        assert!(!outcome.verdict.unwrap().problem_detected);
        assert_eq!(h.search.call_count(), 0);
        assert_eq!(h.corrector.call_count(), 0);
        assert_eq!(&*h.feedback_loop.instructions().current(), I0);
        assert_eq!(h.feedback_loop.instructions().generation(), 0);
        assert_eq!(conversation.turns().len(), 2);
        assert_eq!(conversation.state(), LoopState::Idle);
    }

    #[tokio::test]
    async fn problem_feedback_rewrites_instructions_and_notifies() {
        let h = harness(
            MockProvider::new("persona").with_response("Просто успокойтесь."),
            MockProvider::new("observer").with_response("Есть ОШИБКА: недостаток эмпатии."),
            MockProvider::new("corrector").with_response(REWRITE),
        );
        let mut conversation = Conversation::new(1);

        let outcome = h.feedback_loop.handle_turn(&mut conversation, "Мне тревожно").await;

        assert_eq!(outcome.reply, "Просто успокойтесь.");
        assert_eq!(outcome.notice.as_deref(), Some(CORRECTION_NOTICE));
        assert_eq!(&*h.feedback_loop.instructions().current(), REWRITE);
        assert_eq!(h.feedback_loop.instructions().generation(), 1);

        let corrector_prompt = &h.corrector.requests()[0].user_prompt;
        assert!(corrector_prompt.contains(I0));
        assert!(corrector_prompt.contains("недостаток эмпатии"));

        assert_eq!(
            conversation.transitions(),
            &[
                LoopState::Idle,
                LoopState::AwaitingPersonaReply,
                LoopState::Idle,
                LoopState::AwaitingObserverVerdict,
                LoopState::Correcting,
                LoopState::Idle,
            ]
        );
    }

    #[tokio::test]
    async fn next_turn_uses_the_rewritten_instructions() {
        let h = harness(
            MockProvider::new("persona").with_response("Ответ"),
            MockProvider::new("observer").with_script([
                MockReply::text("проблема с тоном"),
                MockReply::text("Всё хорошо."),
            ]),
            MockProvider::new("corrector").with_response(REWRITE),
        );
        let mut conversation = Conversation::new(1);

        h.feedback_loop.handle_turn(&mut conversation, "первое").await;
        h.feedback_loop.handle_turn(&mut conversation, "второе").await;

        let requests = h.persona.requests();
        assert_eq!(requests[0].system_prompt, I0);
        assert_eq!(requests[1].system_prompt, REWRITE);
    }

    #[tokio::test]
    async fn instructions_only_take_successful_rewrites() {
        let h = harness(
            MockProvider::new("persona").with_response("Ответ"),
            MockProvider::new("observer").with_response("Найдена проблема."),
            MockProvider::new("corrector").with_script([
                MockReply::text(REWRITE),
                MockReply::text("   "),
                MockReply::text("коротко"),
                MockReply::Transport,
                MockReply::QuotaOrAuth,
            ]),
        );
        let mut conversation = Conversation::new(1);

        let first = h.feedback_loop.handle_turn(&mut conversation, "1").await;
        assert!(first.notice.is_some());

        for text in ["2", "3", "4", "5"] {
            let outcome = h.feedback_loop.handle_turn(&mut conversation, text).await;
            assert_eq!(outcome.reply, "Ответ");
            assert!(outcome.notice.is_none());
            assert_eq!(&*h.feedback_loop.instructions().current(), REWRITE);
        }
        assert_eq!(h.feedback_loop.instructions().generation(), 1);
    }

    #[tokio::test]
    async fn reply_survives_observer_and_corrector_failures() {
        let h = harness(
            MockProvider::new("persona").with_response("Я вас слышу."),
            MockProvider::new("observer").with_fallback(MockReply::Transport),
            MockProvider::new("corrector").with_fallback(MockReply::Transport),
        );
        let mut conversation = Conversation::new(1);

        let outcome = h.feedback_loop.handle_turn(&mut conversation, "Мне плохо").await;

        assert_eq!(outcome.reply, "Я вас слышу.");
        assert!(outcome.notice.is_none());
        assert!(outcome.verdict.is_none());
        assert_eq!(h.corrector.call_count(), 0);
        assert_eq!(&*h.feedback_loop.instructions().current(), I0);
        assert_eq!(conversation.state(), LoopState::Idle);
    }

    #[tokio::test]
    async fn corrector_failure_after_problem_keeps_reply() {
        let h = harness(
            MockProvider::new("persona").with_response("Я вас слышу."),
            MockProvider::new("observer").with_response("ошибка в технике"),
            MockProvider::new("corrector").with_fallback(MockReply::QuotaOrAuth),
        );
        let mut conversation = Conversation::new(1);

        let reply = h.feedback_loop.respond(&mut conversation, "Мне плохо").await;
        let review = h.feedback_loop.review(&mut conversation).await;

        assert_eq!(reply.text, "Я вас слышу.");
        assert!(matches!(review.correction, Correction::Failed { .. }));
        assert!(review.notice().is_none());
        assert_eq!(&*h.feedback_loop.instructions().current(), I0);
    }

    #[tokio::test]
    async fn persona_failure_apologises_and_skips_review() {
        let h = harness(
            MockProvider::new("persona").with_fallback(MockReply::QuotaOrAuth),
            MockProvider::new("observer").with_response("ошибка"),
            MockProvider::new("corrector").with_response(REWRITE),
        );
        let mut conversation = Conversation::new(1);

        let outcome = h.feedback_loop.handle_turn(&mut conversation, "Привет").await;

        assert_eq!(outcome.reply, APOLOGY);
        assert_eq!(h.observer.call_count(), 0);
        assert_eq!(conversation.turns().len(), 1);
        assert_eq!(conversation.turns()[0].speaker(), Speaker::User);
    }

    #[tokio::test]
    async fn identical_rewrite_is_applied() {
        let h = harness(
            MockProvider::new("persona").with_response("Ответ"),
            MockProvider::new("observer").with_response("проблема"),
            MockProvider::new("corrector").with_response(I0),
        );
        let mut conversation = Conversation::new(1);

        let outcome = h.feedback_loop.handle_turn(&mut conversation, "текст").await;

        assert_eq!(outcome.notice.as_deref(), Some(CORRECTION_NOTICE));
        assert_eq!(&*h.feedback_loop.instructions().current(), I0);
        assert_eq!(h.feedback_loop.instructions().generation(), 1);
    }

    #[tokio::test]
    async fn research_turn_searches_once_and_carries_a_url() {
        let h = harness_with_search(
            MockProvider::new("persona").with_response("Ответ: Да, КПТ эффективна при тревоге."),
            MockProvider::new("observer").with_response("Хорошо."),
            MockProvider::new("corrector").with_response(REWRITE),
            MockSearchProvider::new().with_hit("CBT", "CBT works", "https://example.org/cbt"),
        );
        let mut conversation = Conversation::new(1);

        let outcome = h
            .feedback_loop
            .handle_turn(&mut conversation, "исследования показывают, что КПТ работает?")
            .await;

        assert_eq!(h.search.call_count(), 1);
        assert!(outcome.reply.contains("https://example.org/cbt"));
    }

    #[tokio::test]
    async fn windows_limit_persona_and_observer_context() {
        let h = harness(
            MockProvider::new("persona").with_response("r"),
            MockProvider::new("observer").with_response("ok"),
            MockProvider::new("corrector").with_response(REWRITE),
        );
        let mut conversation = Conversation::new(1);
        for i in 0..5 {
            h.feedback_loop
                .handle_turn(&mut conversation, &format!("msg{i}"))
                .await;
        }

        // Eight turns precede msg4; the persona sees the last five.
        let persona_prompt = &h.persona.requests()[4].user_prompt;
        assert!(!persona_prompt.contains("msg1"));
        assert!(persona_prompt.starts_with(
            "История беседы:\nПсихолог: r\nКлиент: msg2\nПсихолог: r\nКлиент: msg3\nПсихолог: r\n\nВопрос клиента: msg4"
        ));

        // The observer sees the last six turns, including the fresh reply.
        let observer_prompt = &h.observer.requests()[4].user_prompt;
        assert!(observer_prompt.contains(
            "Клиент: msg2\nПсихолог: r\nКлиент: msg3\nПсихолог: r\nКлиент: msg4\nПсихолог: r"
        ));
        assert!(!observer_prompt.contains("msg1"));
    }

    /// Replaces the shared instructions mid-call, as a concurrent correction
    /// from another user's turn would.
    struct SwappingProvider {
        instructions: PersonaInstructions,
    }

    #[async_trait]
    impl LlmProvider for SwappingProvider {
        fn name(&self) -> &str {
            "swapping"
        }

        async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, ReframeError> {
            self.instructions.replace(REWRITE);
            Ok(LlmResponse {
                content: format!("saw: {}", request.system_prompt),
                provider: "swapping".into(),
                model: request.model.clone(),
                tokens_used: 0,
                latency_ms: 0,
            })
        }
    }

    #[tokio::test]
    async fn in_flight_reply_keeps_its_snapshot() {
        let settings = LoopSettings::default();
        let instructions = PersonaInstructions::new(I0);
        let llm = Arc::new(SwappingProvider {
            instructions: instructions.clone(),
        });
        let observer = Arc::new(MockProvider::new("observer").with_response("ok"));
        let feedback_loop = FeedbackLoop::new(
            PersonaResponder::new(llm.clone(), Arc::new(MockSearchProvider::new()), &settings),
            QualityObserver::new(observer.clone(), &settings),
            PromptCorrector::new(observer, &settings),
            instructions,
            &settings,
        );
        let mut conversation = Conversation::new(1);

        let reply = feedback_loop.respond(&mut conversation, "Здравствуйте").await;

        assert_eq!(reply.text, format!("saw: {I0}"));
        assert_eq!(reply.generation, 0);
        assert_eq!(&*feedback_loop.instructions().current(), REWRITE);
    }
}
