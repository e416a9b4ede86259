// File: lisabot-core/tests/pipeline_tests.rs

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use lisabot_common::models::emoji::GuildEmoji;
use lisabot_common::models::message::{ChatMessage, InboundMessage};
use lisabot_common::traits::platform_traits::ChatOutbound;
use lisabot_common::traits::recorder_traits::Recorder;
use lisabot_core::model::{EmojiClassifier, LabelMap, ModelBundle, ModelHandle, SparseVector};
use lisabot_core::model::{FeatureTransform, ProbabilityEstimator, TextVectorizer};
use lisabot_core::random::RandomSource;
use lisabot_core::services::{MessageDispatcher, MessagePipeline, OutboundAction, TriggerTable};
use lisabot_core::state::ActivityCounter;
use lisabot_core::{BotConfig, Error};

const BOT_ID: u64 = 123;

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Reply { to: u64, text: String },
    Post { channel: u64, text: String },
}

/// Records what would have been sent; optionally fails every call.
#[derive(Default)]
struct FakeOutbound {
    sent: Mutex<Vec<Sent>>,
    fail: bool,
}

#[async_trait]
impl ChatOutbound for FakeOutbound {
    async fn reply_to(&self, message: &ChatMessage, text: &str) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Platform("missing permissions".into()));
        }
        self.sent.lock().push(Sent::Reply { to: message.message_id, text: text.into() });
        Ok(())
    }

    async fn send_to_channel(&self, channel: u64, text: &str) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Platform("missing permissions".into()));
        }
        self.sent.lock().push(Sent::Post { channel, text: text.into() });
        Ok(())
    }
}

#[derive(Default)]
struct FakeRecorder {
    recorded: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl Recorder for FakeRecorder {
    async fn record(&self, message: &ChatMessage, _guild_emojis: &[GuildEmoji]) -> Result<(), Error> {
        self.recorded.lock().push(message.content.clone());
        if self.fail {
            return Err(Error::Platform("disk full".into()));
        }
        Ok(())
    }
}

/// Rolls and picks replayed from queues; defaults to losing rolls and index 0.
#[derive(Default)]
struct QueuedRandom {
    rolls: VecDeque<u32>,
    picks: VecDeque<usize>,
}

impl RandomSource for QueuedRandom {
    fn roll(&mut self, upper: u32) -> u32 {
        self.rolls.pop_front().unwrap_or(upper)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.picks.pop_front().unwrap_or(0).min(len - 1)
    }
}

/// One feature: whether the text mentions pizza.
struct PizzaVectorizer;

impl TextVectorizer for PizzaVectorizer {
    fn transform(&self, text: &str) -> SparseVector {
        if text.contains("pizza") { vec![(0, 1.0)] } else { Vec::new() }
    }

    fn n_features(&self) -> usize {
        1
    }
}

struct Identity;

impl FeatureTransform for Identity {
    fn transform(&self, features: SparseVector) -> SparseVector {
        features
    }

    fn n_features(&self) -> usize {
        1
    }
}

/// Label 0 fires on pizza; label 1 never does.
struct PizzaEstimator;

impl ProbabilityEstimator for PizzaEstimator {
    fn predict_proba(&self, features: &SparseVector) -> Vec<f64> {
        if features.is_empty() { vec![0.01, 0.01] } else { vec![0.9, 0.05] }
    }

    fn n_labels(&self) -> usize {
        2
    }
}

fn pizza_models() -> Arc<ModelHandle> {
    Arc::new(ModelHandle::new(ModelBundle::new(
        Box::new(PizzaVectorizer),
        Box::new(Identity),
        Box::new(PizzaEstimator),
        LabelMap::from_names(["pizzaparty", "lisacry"]),
    )))
}

fn catalog() -> Vec<GuildEmoji> {
    vec![
        GuildEmoji { id: 500, name: "PizzaParty".into(), animated: false },
        GuildEmoji { id: 501, name: "lisacry".into(), animated: false },
    ]
}

fn inbound(message_id: u64, author_id: u64, author_name: &str, content: &str) -> InboundMessage {
    InboundMessage {
        message: ChatMessage {
            message_id,
            channel_id: 42,
            guild_id: Some(7),
            author_id,
            author_name: author_name.into(),
            author_is_bot: false,
            content: content.into(),
        },
        guild_emojis: catalog(),
    }
}

struct Harness {
    dispatcher: MessageDispatcher,
    outbound: Arc<FakeOutbound>,
    recorder: Arc<FakeRecorder>,
    activity: Arc<ActivityCounter>,
}

fn harness(activity: i64, rng: QueuedRandom, outbound: FakeOutbound, recorder: FakeRecorder) -> Harness {
    let config = BotConfig::default();
    let activity = Arc::new(ActivityCounter::new(activity));
    let outbound = Arc::new(outbound);
    let recorder = Arc::new(recorder);
    let pipeline = MessagePipeline::new(
        &config,
        BOT_ID,
        TriggerTable::builtin(),
        Arc::new(EmojiClassifier::new(pizza_models(), config.emoji_threshold)),
        activity.clone(),
        Box::new(rng),
    );
    let dispatcher = MessageDispatcher::new(pipeline, outbound.clone())
        .with_recorder(recorder.clone(), config.training_source.clone());
    Harness { dispatcher, outbound, recorder, activity }
}

#[tokio::test]
async fn echo_is_posted_once_per_held_message() -> Result<(), Error> {
    let mut h = harness(10, QueuedRandom::default(), FakeOutbound::default(), FakeRecorder::default());

    h.dispatcher.dispatch(inbound(1, 1, "amy", "first!!")).await?;
    h.dispatcher.dispatch(inbound(2, 2, "bo", "first!!")).await?;
    h.dispatcher.dispatch(inbound(3, 3, "cy", "first!!")).await?;

    let sent = h.outbound.sent.lock().clone();
    assert_eq!(sent, vec![Sent::Post { channel: 42, text: "first!!".into() }]);
    Ok(())
}

#[tokio::test]
async fn builtin_trigger_replies_with_canned_text() -> Result<(), Error> {
    let mut h = harness(10, QueuedRandom::default(), FakeOutbound::default(), FakeRecorder::default());

    let action = h.dispatcher.dispatch(inbound(9, 1, "amy", "<@123> are you the real lisa?")).await?;
    assert_eq!(action, Some(OutboundAction::Reply("I am the real Lisa".into())));
    assert_eq!(h.outbound.sent.lock()[0], Sent::Reply { to: 9, text: "I am the real Lisa".into() });
    // Triggers stop the pipeline before the mention boost.
    assert_eq!(h.activity.get(), 10);
    Ok(())
}

#[tokio::test]
async fn mention_with_question_combines_likert_and_emoji() -> Result<(), Error> {
    // picks: category 0 (strong agree), phrase 2 ("Absolutely!"); roll 1 => reply
    let rng = QueuedRandom { rolls: VecDeque::from([1]), picks: VecDeque::from([0, 2]) };
    let mut h = harness(5, rng, FakeOutbound::default(), FakeRecorder::default());

    h.dispatcher.dispatch(inbound(9, 1, "amy", "<@123> is pizza good?")).await?;

    assert_eq!(
        h.outbound.sent.lock().clone(),
        vec![Sent::Reply { to: 9, text: "Absolutely! <:PizzaParty:500>".into() }]
    );
    assert_eq!(h.activity.get(), 7);
    Ok(())
}

#[tokio::test]
async fn sleeping_bot_stays_quiet() -> Result<(), Error> {
    let rng = QueuedRandom { rolls: VecDeque::from([1, 1, 1]), picks: VecDeque::new() };
    let mut h = harness(0, rng, FakeOutbound::default(), FakeRecorder::default());

    let action = h.dispatcher.dispatch(inbound(1, 1, "amy", "pizza time")).await?;
    assert_eq!(action, None);
    assert!(h.outbound.sent.lock().is_empty());
    assert_eq!(h.activity.get(), 0);
    Ok(())
}

#[tokio::test]
async fn training_source_is_recorded_even_when_silent() -> Result<(), Error> {
    let recorder = FakeRecorder { fail: true, ..Default::default() };
    let mut h = harness(0, QueuedRandom::default(), FakeOutbound::default(), recorder);

    h.dispatcher.dispatch(inbound(1, 1, "lisa38", "hello <:lisacry:501>")).await?;
    h.dispatcher.dispatch(inbound(2, 2, "amy", "not recorded")).await?;

    assert_eq!(h.recorder.recorded.lock().clone(), vec!["hello <:lisacry:501>".to_string()]);
    Ok(())
}

#[tokio::test]
async fn bot_messages_are_ignored() -> Result<(), Error> {
    let mut h = harness(10, QueuedRandom::default(), FakeOutbound::default(), FakeRecorder::default());

    let mut msg = inbound(1, 1, "lisa38", "lisa burger");
    msg.message.author_is_bot = true;
    let action = tokio_test::assert_ok!(h.dispatcher.dispatch(msg).await);
    assert_eq!(action, None);
    assert!(h.recorder.recorded.lock().is_empty());
    assert!(h.outbound.sent.lock().is_empty());
    Ok(())
}

#[tokio::test]
async fn send_failure_is_reported_and_next_message_still_handled() {
    let outbound = FakeOutbound { fail: true, ..Default::default() };
    let mut h = harness(10, QueuedRandom::default(), outbound, FakeRecorder::default());

    let first = h.dispatcher.dispatch(inbound(1, 1, "amy", "lisa burger")).await;
    assert!(matches!(first, Err(Error::Platform(_))));

    // Echo state was still updated by the failed message.
    let second = h.dispatcher.dispatch(inbound(2, 2, "bo", "lisa burger")).await;
    assert!(matches!(second, Err(Error::Platform(_))));
    assert_eq!(
        h.dispatcher.pipeline().echo_tracker().previous(),
        &lisabot_core::state::PreviousMessage::Consumed
    );
}

#[tokio::test]
async fn run_loop_drains_channel_until_closed() {
    let h = harness(10, QueuedRandom::default(), FakeOutbound::default(), FakeRecorder::default());
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let outbound = h.outbound.clone();
    let task = tokio::spawn(h.dispatcher.run(rx));

    tx.send(inbound(1, 1, "amy", "erm actually")).unwrap();
    tx.send(inbound(2, 2, "bo", "ramesh")).unwrap();
    drop(tx);
    task.await.unwrap();

    assert_eq!(outbound.sent.lock().len(), 2);
}
