//! Behavioural properties of the anger meter

use std::sync::Arc;

use temper_core::emotion::anger::{AngerLevel, AngerMeter, AngerMeterState};
use temper_core::emotion::config::AngerConfig;
use temper_core::emotion::sentiment::SentimentJudgment;

const UTTERANCES: &[&str] = &[
    "hello there",
    "you're an idiot",
    "I'm sorry",
    "sorry, my bad",
    "fuck this",
    "WHY WONT YOU LISTEN!!!",
    "thanks, I appreciate it",
    "whatever",
    "this is taking forever",
];

const EMOTIONS: &[&str] = &["anger", "joy", "sadness", "neutral", "frustration", "rage", "surprise"];

/// Small deterministic generator so the sequences are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next() % items.len() as u64) as usize]
    }

    fn unit(&mut self) -> f64 {
        (self.next() % 101) as f64 / 100.0
    }
}

fn configs() -> Vec<AngerConfig> {
    vec![
        AngerConfig::default(),
        AngerConfig {
            escalation_cooldown_turns: 0,
            enraged_apology_requirement: 1,
            ..Default::default()
        },
        AngerConfig {
            anger_multiplier: 40.0,
            escalation_cooldown_turns: 0,
            idle_decay: 10.0,
            apology_penalty: 30.0,
            ..Default::default()
        },
        AngerConfig {
            apology_memory_turns: 2,
            enraged_apology_requirement: 3,
            ..Default::default()
        },
    ]
}

fn judged(emotion: &str, intensity: f64) -> SentimentJudgment {
    SentimentJudgment::new(emotion, intensity)
}

#[test]
fn test_random_sequences_respect_invariants() {
    for (seed, config) in configs().into_iter().enumerate() {
        let config = Arc::new(config);
        let mut rng = Lcg(seed as u64 + 7);

        for _ in 0..20 {
            let mut meter = AngerMeter::new(config.clone());
            for _ in 0..60 {
                let before = meter.state().clone();
                let utterance = rng.pick(UTTERANCES);
                let judgment = judged(rng.pick(EMOTIONS), rng.unit());

                let (level, info) = meter.process(utterance, &judgment);

                let jump = (i16::from(level.rank()) - i16::from(before.level.rank())).abs();
                assert!(jump <= 1, "{:?} -> {:?} on {:?}", before.level, level, utterance);

                assert!(info.points >= config.min_points && info.points <= config.max_points);
                assert_eq!(info.points, meter.state().points);

                if info.is_angry {
                    assert!(info.delta >= 0.0, "angry turn lowered points: {:?}", info);
                }

                if before.level == AngerLevel::Enraged && level != AngerLevel::Enraged {
                    assert!(info.apologies_in_window >= config.enraged_apology_requirement);
                }
            }
        }
    }
}

#[test]
fn test_frustrated_message_stays_normal() {
    let mut meter = AngerMeter::new(Arc::new(AngerConfig::default()));
    let (level, info) = meter.process("I am so frustrated!!", &judged("anger", 0.7));

    assert!((info.points - 10.5).abs() < 1e-9);
    assert_eq!(level, AngerLevel::Normal);
}

#[test]
fn test_three_angry_turns_reach_agitated_not_enraged() {
    let mut meter = AngerMeter::new(Arc::new(AngerConfig::default()));
    let mut levels = Vec::new();
    for _ in 0..3 {
        levels.push(meter.process("this is taking forever", &judged("anger", 0.8)).0);
    }

    assert_eq!(levels.last(), Some(&AngerLevel::Agitated));
    assert!(!levels.contains(&AngerLevel::Enraged));
}

#[test]
fn test_points_saturate_at_max() {
    let mut meter = AngerMeter::new(Arc::new(AngerConfig::default()));
    let mut last = 0.0;
    for _ in 0..15 {
        let (_, info) = meter.process("fuck you, you're an idiot", &judged("rage", 1.0));
        assert!(info.points >= last);
        last = info.points;
    }
    assert_eq!(last, 100.0);
    assert_eq!(meter.level(), AngerLevel::Enraged);
    assert!(meter.is_maxed_out());
}

fn enraged_at(points: f64) -> AngerMeter {
    AngerMeter::from_state(
        Arc::new(AngerConfig::default()),
        AngerMeterState {
            points,
            level: AngerLevel::Enraged,
            message_count: 10,
            ..Default::default()
        },
    )
}

#[test]
fn test_single_apology_does_not_calm_enraged() {
    let mut meter = enraged_at(80.0);
    let (level, info) = meter.process("I'm sorry", &judged("sadness", 0.4));

    assert_eq!(level, AngerLevel::Enraged);
    assert_eq!(meter.state().apology_count, 1);
    assert_eq!(info.apologies_in_window, 1);
    assert_eq!(info.apology_requirement, 2);
}

#[test]
fn test_enraged_gate_blocks_even_at_low_points() {
    let mut meter = enraged_at(30.0);
    for _ in 0..5 {
        let (level, _) = meter.process("ok", &judged("neutral", 0.2));
        assert_eq!(level, AngerLevel::Enraged);
    }
    assert_eq!(meter.state().points, 20.0);
}

#[test]
fn test_two_apologies_step_down_one_level_at_a_time() {
    let mut meter = enraged_at(60.0);

    let (level, _) = meter.process("I'm sorry", &judged("neutral", 0.3));
    assert_eq!(level, AngerLevel::Enraged);

    let (level, info) = meter.process("I'm so sorry, my bad", &judged("sadness", 0.5));
    assert_eq!(info.apologies_in_window, 2);
    assert!(!info.de_escalation_blocked);
    assert_eq!(level, AngerLevel::Agitated);

    let (level, _) = meter.process("sorry again", &judged("neutral", 0.3));
    assert_eq!(level, AngerLevel::Irritated);
}

#[test]
fn test_renewed_anger_resets_apology_progress() {
    let mut meter = enraged_at(60.0);
    meter.process("I'm sorry", &judged("neutral", 0.3));
    assert_eq!(meter.state().apology_count, 1);

    let (_, info) = meter.process("this is taking forever", &judged("anger", 0.5));
    assert_eq!(meter.state().apology_count, 0);
    assert!(meter.state().recent_apology_turn_numbers.is_empty());
    assert!(info.reasons.iter().any(|r| r.contains("apology progress reset")));

    let (level, _) = meter.process("sorry", &judged("neutral", 0.3));
    assert_eq!(level, AngerLevel::Enraged);
}

#[test]
fn test_no_double_jump_down() {
    let mut meter = AngerMeter::from_state(
        Arc::new(AngerConfig::default()),
        AngerMeterState {
            points: 5.0,
            level: AngerLevel::Enraged,
            apology_count: 2,
            recent_apology_turn_numbers: vec![1, 2],
            message_count: 2,
            ..Default::default()
        },
    );

    let calm = judged("neutral", 0.2);
    assert_eq!(meter.process("ok", &calm).0, AngerLevel::Agitated);
    assert_eq!(meter.process("ok", &calm).0, AngerLevel::Irritated);
    assert_eq!(meter.process("ok", &calm).0, AngerLevel::Normal);
}

#[test]
fn test_anger_persists_through_neutral_turn() {
    let mut meter = AngerMeter::from_state(
        Arc::new(AngerConfig::default()),
        AngerMeterState {
            points: 40.0,
            level: AngerLevel::Agitated,
            consecutive_anger_streak: 3,
            ..Default::default()
        },
    );
    let (level, info) = meter.process("anyway, what's your favourite book?", &judged("neutral", 0.4));

    assert_eq!(level, AngerLevel::Agitated);
    assert!(!info.is_angry);
    assert_eq!(info.streak, 0);
    assert_eq!(info.points, 38.0);
}

#[test]
fn test_reset_after_sequence() {
    let mut meter = AngerMeter::new(Arc::new(AngerConfig::default()));
    for utterance in ["fuck this", "you're an idiot", "I'm sorry", "SHUT UP NOW!!!"] {
        meter.process(utterance, &judged("anger", 0.9));
    }
    assert!(meter.state().points > 0.0);

    meter.reset_meter();
    let state = meter.state();
    assert_eq!(state.points, 0.0);
    assert_eq!(state.level, AngerLevel::Normal);
    assert_eq!(state.apology_count, 0);
    assert_eq!(state.message_count, 0);
}
