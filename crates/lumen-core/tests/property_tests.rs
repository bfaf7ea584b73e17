use lumen_core::fuzzy::{fuzzy_evaluate, select_action};
use lumen_core::gatekeeper::{EffectFiredEvent, EffectGatekeeper, Mood, MoodPolicy};
use lumen_core::{
    EffectKind, FuzzyAction, FuzzyInput, FuzzyScores, HuntConfig, HuntEngine, HuntInput,
    HuntPhase, SectionType, Trend, Vibe,
};
use proptest::prelude::*;

fn section_strategy() -> impl Strategy<Value = SectionType> {
    prop_oneof![
        Just(SectionType::Intro),
        Just(SectionType::Verse),
        Just(SectionType::Buildup),
        Just(SectionType::Chorus),
        Just(SectionType::Drop),
        Just(SectionType::Bridge),
        Just(SectionType::Breakdown),
        Just(SectionType::Outro),
    ]
}

fn vibe_strategy() -> impl Strategy<Value = Vibe> {
    prop::sample::select(Vibe::ALL.to_vec())
}

fn mood_strategy() -> impl Strategy<Value = Mood> {
    prop::sample::select(Mood::ALL.to_vec())
}

fn effect_strategy() -> impl Strategy<Value = EffectKind> {
    prop::sample::select(EffectKind::ALL.to_vec())
}

fn hunt_input_strategy() -> impl Strategy<Value = HuntInput> {
    (
        vibe_strategy(),
        section_strategy(),
        any::<bool>(),
        0.0f32..=1.0,
        0.0f32..=1.0,
        0.0f32..=1.0,
        0.0f32..=1.0,
        prop_oneof![Just(Trend::Rising), Just(Trend::Stable), Just(Trend::Falling)],
    )
        .prop_map(
            |(vibe, section, is_building, beauty, consonance, tension, rhythm, beauty_trend)| {
                HuntInput {
                    vibe,
                    section,
                    is_building,
                    beauty,
                    beauty_trend,
                    consonance,
                    tension,
                    rhythm,
                    spectral: None,
                    timestamp_ms: 0,
                }
            },
        )
}

fn legal_transition(from: HuntPhase, to: HuntPhase) -> bool {
    use HuntPhase::*;
    from == to
        || matches!(
            (from, to),
            (Sleeping, Stalking)
                | (Stalking, Evaluating)
                | (Stalking, Sleeping)
                | (Evaluating, Striking)
                | (Evaluating, Stalking)
                | (Striking, Learning)
                | (Learning, Stalking)
        )
}

proptest! {
    #[test]
    fn prop_fuzzy_priority_is_total(
        force in 0.0f32..=1.0,
        strike in 0.0f32..=1.0,
        prepare in 0.0f32..=1.0,
        hold in 0.0f32..=1.0,
    ) {
        let scores = FuzzyScores { force_strike: force, strike, prepare, hold };
        let action = select_action(&scores);
        if force > 0.5 {
            prop_assert_eq!(action, FuzzyAction::ForceStrike);
        } else {
            prop_assert_ne!(action, FuzzyAction::ForceStrike);
        }
    }

    #[test]
    fn prop_fuzzy_intensity_within_action_range(
        energy in 0.0f32..=1.0,
        z_score in -5.0f32..=6.0,
        section in section_strategy(),
        harshness in 0.0f32..=1.0,
        hunt_score in 0.0f32..=1.0,
        beauty in 0.0f32..=1.0,
    ) {
        let decision = fuzzy_evaluate(&FuzzyInput {
            energy,
            z_score,
            section,
            harshness,
            hunt_score,
            beauty,
        });
        let (min, max) = decision.action.intensity_range();
        prop_assert!(decision.intensity >= min - 1e-5);
        prop_assert!(decision.intensity <= max + 1e-5);
        prop_assert!(decision.confidence >= 0.0);
    }

    #[test]
    fn prop_hunt_never_skips_states(inputs in prop::collection::vec(hunt_input_strategy(), 1..300)) {
        let mut engine = HuntEngine::new(HuntConfig::default());
        let mut phase = engine.phase();
        let mut ever_stalked_and_evaluated = false;
        for (frame, mut input) in inputs.into_iter().enumerate() {
            input.timestamp_ms = frame as u64 * 33;
            let decision = engine.process(&input);
            prop_assert!(
                legal_transition(phase, decision.phase),
                "illegal transition {} -> {}", phase, decision.phase
            );
            if phase == HuntPhase::Evaluating {
                ever_stalked_and_evaluated = true;
            }
            if decision.phase == HuntPhase::Striking {
                prop_assert!(ever_stalked_and_evaluated);
            }
            phase = decision.phase;
        }
    }

    #[test]
    fn prop_cooldown_window(
        effect in effect_strategy(),
        vibe in vibe_strategy(),
        mood in mood_strategy(),
        fired_at in 0u64..1_000_000,
        offset in 0u64..200_000,
    ) {
        let profile = mood.profile();
        prop_assume!(!profile.is_effect_force_unlocked(effect));
        prop_assume!(!profile.is_effect_blocked(effect));

        let mut gatekeeper = EffectGatekeeper::new();
        gatekeeper.register_effect_fired(EffectFiredEvent { id: 1, effect, timestamp_ms: fired_at });
        let cooldown = gatekeeper.effective_cooldown_ms(effect, vibe, &profile);
        let now = fired_at + offset;
        let availability = gatekeeper.check_availability(effect, vibe, &profile, now);
        prop_assert_eq!(availability.available, offset >= cooldown);
        prop_assert_eq!(
            availability.clone(),
            gatekeeper.check_availability(effect, vibe, &profile, now)
        );
    }
}
