//! End-to-end turns through `DialogueEngine` with scripted language models.

use async_trait::async_trait;
use salon_dialogue::{
    replies, CompletionRequest, DialogueConfig, DialogueEngine, LanguageModel, LlmError,
    ReplyRoute,
};
use salon_types::{ConversationState, Treatment};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Replies with fixed text and records every request.
#[derive(Default)]
struct ScriptedModel {
    reply: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

/// Never answers.
#[derive(Default)]
struct HangingModel {
    started: AtomicUsize,
}

#[async_trait]
impl LanguageModel for HangingModel {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        unreachable!()
    }
}

struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        Err(LlmError::Status {
            status: 503,
            body: "overloaded".to_string(),
        })
    }
}

fn engine(model: Arc<dyn LanguageModel>, timeout: Duration) -> DialogueEngine {
    DialogueEngine::new(
        model,
        DialogueConfig {
            model_timeout: timeout,
            ..DialogueConfig::default()
        },
    )
}

fn with_treatment(treatment: Treatment) -> ConversationState {
    ConversationState {
        treatment: Some(treatment),
        booking_time: None,
    }
}

#[tokio::test]
async fn empty_utterance_is_answered_without_touching_state() {
    let model = ScriptedModel::new("唔應該用到");
    let engine = engine(model.clone(), Duration::from_secs(1));
    let state = ConversationState {
        treatment: Some(Treatment::PicoLaser),
        booking_time: Some("星期三".to_string()),
    };

    for utterance in ["", "   "] {
        let turn = engine.generate_reply(utterance, &state).await;
        assert_eq!(turn.reply, replies::UNHEARD);
        assert_eq!(turn.state, state);
        assert_eq!(turn.route, ReplyRoute::Unheard);
    }
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn booking_on_empty_state_uses_quick_path() {
    let model = ScriptedModel::new("唔應該用到");
    let engine = engine(model.clone(), Duration::from_secs(1));

    let turn = engine
        .generate_reply("我想預約", &ConversationState::default())
        .await;
    assert_eq!(turn.route, ReplyRoute::QuickPath);
    assert!(turn.reply.contains("邊款療程"));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn state_accumulates_across_turns() {
    let model = ScriptedModel::new("好呀。");
    let engine = engine(model.clone(), Duration::from_secs(1));

    let first = engine
        .generate_reply("我想預約 basic facial", &ConversationState::default())
        .await;
    assert_eq!(first.state.treatment, Some(Treatment::BasicFacial));
    assert!(first.reply.contains("邊日同幾點"));

    let second = engine.generate_reply("聽日下晝三點預約", &first.state).await;
    assert_eq!(second.state.booking_time.as_deref(), Some("聽日下晝三點預約"));
    assert!(second.reply.contains("電話號碼"));

    let third = engine.generate_reply("幾多錢", &second.state).await;
    assert!(third.reply.contains("$480"));
    assert_eq!(third.state, second.state);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn approved_turn_without_rule_falls_through_to_model() {
    let model = ScriptedModel::new("我哋最早聽日十一點有位。");
    let engine = engine(model.clone(), Duration::from_secs(1));

    // "幾點" passes the classifier but no rule answers it.
    let turn = engine
        .generate_reply("幾點有位", &ConversationState::default())
        .await;
    assert_eq!(turn.route, ReplyRoute::Model);
    assert_eq!(turn.reply, "我哋最早聽日十一點有位。");
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn model_sees_known_facts_and_reasks_are_filtered() {
    let model = ScriptedModel::new("冇問題呀。你想做邊款療程呢？深層清潔做完皮膚會好滑(真係)。");
    let engine = engine(model.clone(), Duration::from_secs(1));

    let turn = engine
        .generate_reply(
            "做完會唔會紅",
            &with_treatment(Treatment::DeepCleanseFacial),
        )
        .await;
    assert_eq!(turn.route, ReplyRoute::Model);
    assert_eq!(turn.reply, "冇問題呀。深層清潔做完皮膚會好滑。");

    let requests = model.requests.lock().unwrap();
    let request = &requests[0];
    assert!(request.prompt.contains("客人已經選擇療程：深層清潔 facial"));
    assert!(request.prompt.ends_with("客人：「做完會唔會紅」\n你："));
    assert_eq!(request.params.max_output_tokens, 60);
    assert!(request.system.contains("美容院"));
}

#[tokio::test]
async fn model_reply_filtered_to_nothing_gets_canned_text() {
    let model = ScriptedModel::new("你想做咩療程？");
    let engine = engine(model, Duration::from_secs(1));

    let turn = engine
        .generate_reply("有冇優惠", &with_treatment(Treatment::BasicFacial))
        .await;
    assert_eq!(turn.route, ReplyRoute::ModelEmpty);
    assert_eq!(turn.reply, replies::NO_MODEL_TEXT);
}

#[tokio::test]
async fn punctuation_only_model_reply_gets_canned_text() {
    for raw in ["(微笑)", "---", "**"] {
        let engine = engine(ScriptedModel::new(raw), Duration::from_secs(1));
        let turn = engine
            .generate_reply("你好", &ConversationState::default())
            .await;
        assert_eq!(turn.route, ReplyRoute::ModelEmpty, "{:?}", raw);
        assert_eq!(turn.reply, replies::NO_MODEL_TEXT);
    }
}

#[tokio::test]
async fn blank_model_reply_gets_canned_text() {
    let engine = engine(ScriptedModel::new("  \n "), Duration::from_secs(1));
    let turn = engine
        .generate_reply("你好", &ConversationState::default())
        .await;
    assert_eq!(turn.route, ReplyRoute::ModelEmpty);
    assert_eq!(turn.reply, replies::NO_MODEL_TEXT);
}

#[tokio::test]
async fn hanging_model_is_bounded_by_timeout() {
    let model = Arc::new(HangingModel::default());
    let engine = engine(model.clone(), Duration::from_millis(100));

    let started = Instant::now();
    let turn = engine
        .generate_reply("你好", &ConversationState::default())
        .await;
    let elapsed = started.elapsed();

    assert_eq!(model.started.load(Ordering::SeqCst), 1);
    assert_eq!(turn.route, ReplyRoute::TimedOut);
    assert_eq!(turn.reply, replies::BUSY);
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);
}

#[tokio::test]
async fn timeout_prefers_rule_fallback() {
    let engine = engine(Arc::new(HangingModel::default()), Duration::from_millis(50));

    // Location questions are not quick-path, but a rule can still answer them.
    let turn = engine
        .generate_reply("你哋喺邊度", &ConversationState::default())
        .await;
    assert_eq!(turn.route, ReplyRoute::TimedOut);
    assert_eq!(turn.reply, salon_dialogue::responder::LOCATION_REPLY);
}

#[tokio::test]
async fn provider_error_falls_back_like_timeout() {
    let engine = engine(Arc::new(FailingModel), Duration::from_secs(1));

    let turn = engine
        .generate_reply("你好", &ConversationState::default())
        .await;
    assert_eq!(turn.route, ReplyRoute::Failed);
    assert_eq!(turn.reply, replies::TECHNICAL_PROBLEM);

    let turn = engine
        .generate_reply("What are your opening hours?", &ConversationState::default())
        .await;
    assert_eq!(turn.route, ReplyRoute::Failed);
    assert_eq!(turn.reply, salon_dialogue::responder::OPENING_HOURS_REPLY);
}

#[tokio::test]
async fn concurrent_sessions_do_not_block_each_other() {
    let engine = Arc::new(engine(
        Arc::new(HangingModel::default()),
        Duration::from_millis(300),
    ));

    let slow = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .generate_reply("你好", &ConversationState::default())
                .await
        })
    };

    let started = Instant::now();
    let quick = engine
        .generate_reply("我想預約", &ConversationState::default())
        .await;
    assert_eq!(quick.route, ReplyRoute::QuickPath);
    assert!(started.elapsed() < Duration::from_millis(300));

    let slow = slow.await.unwrap();
    assert_eq!(slow.route, ReplyRoute::TimedOut);
}
