//! Control-message composition for note playback and effect setup.
//!
//! Parameters are not passed with `/s_new` itself; every control is set by a
//! separate `/n_set` that follows the creation message, so order within a
//! batch matters.

use timbre_types::envelope::is_override;
use timbre_types::message::{
    build_n_set_int_message, build_n_set_message, build_s_new_message, ADD_BEFORE, ADD_TO_HEAD,
    DEFAULT_GROUP,
};
use timbre_types::source::EFFECT_DEFS;
use timbre_types::{BusId, ControlMessage, NodeId, PlayRequest, Source, MILLIS_PER_SEC, PERCENTAGE_MAX};

/// Where a session's notes are created and routed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteRouting {
    pub source: Source,
    /// Effect synth the note is placed before.
    pub effect_node: NodeId,
    /// Bus the note's output is written to.
    pub effect_bus: BusId,
}

/// Messages that create a session's effect synth and point it at its bus.
/// Sent once, before any note is routed to the bus.
pub fn compose_effect_setup(effect_node: NodeId, effect_bus: BusId) -> Vec<ControlMessage> {
    let mut messages = Vec::with_capacity(EFFECT_DEFS.len() * 2);
    for def in EFFECT_DEFS {
        messages.push(build_s_new_message(
            def,
            effect_node.get(),
            ADD_TO_HEAD,
            DEFAULT_GROUP,
        ));
        messages.push(build_n_set_int_message(
            effect_node.get(),
            "inBus",
            effect_bus.get(),
        ));
    }
    messages
}

/// Ordered batch that plays `request` as node `note_id`.
pub fn compose(request: &PlayRequest, note_id: NodeId, routing: &NoteRouting) -> Vec<ControlMessage> {
    let id = note_id.get();
    let mut messages = vec![
        build_s_new_message(
            routing.source.synth_def(),
            id,
            ADD_BEFORE,
            routing.effect_node.get(),
        ),
        build_n_set_message(id, "freq", request.frequency_hz),
        build_n_set_message(id, "duration", request.duration_secs()),
        build_n_set_message(id, "mul", request.gain()),
        build_n_set_int_message(id, "effectBus", routing.effect_bus.get()),
    ];

    let env = &request.envelope;
    for (name, ms) in [
        ("attack", env.attack),
        ("decay", env.decay),
        ("sustain", env.sustain),
        ("release", env.release),
    ] {
        if is_override(ms) {
            messages.push(build_n_set_message(id, name, ms / MILLIS_PER_SEC));
        }
    }
    if is_override(env.reverb) {
        messages.push(build_n_set_message(id, "reverb", env.reverb / PERCENTAGE_MAX));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use timbre_types::{EnvelopeParams, RawArg, USE_ENGINE_DEFAULT};

    fn routing() -> NoteRouting {
        NoteRouting {
            source: Source::Saw,
            effect_node: NodeId::new(2),
            effect_bus: BusId::new(4),
        }
    }

    fn request(envelope: EnvelopeParams) -> PlayRequest {
        PlayRequest {
            frequency_hz: 440.0,
            duration_ms: 250.0,
            volume_percent: 80.0,
            envelope,
        }
    }

    fn controls(messages: &[ControlMessage]) -> Vec<&str> {
        messages.iter().filter_map(|m| m.control_name()).collect()
    }

    #[test]
    fn default_envelope_yields_five_messages() {
        let messages = compose(&request(EnvelopeParams::default()), NodeId::new(9), &routing());
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].addr, "/s_new");
        assert_eq!(
            messages[0].args,
            vec![
                RawArg::Str("saw-inst".into()),
                RawArg::Int(9),
                RawArg::Int(ADD_BEFORE),
                RawArg::Int(2),
            ]
        );
        assert_eq!(controls(&messages), vec!["freq", "duration", "mul", "effectBus"]);
        assert!(messages.iter().all(|m| m.node_id() == Some(9)));
    }

    #[test]
    fn units_are_converted() {
        let messages = compose(&request(EnvelopeParams::default()), NodeId::new(9), &routing());
        assert_eq!(messages[1].args[2], RawArg::Float(440.0));
        assert_eq!(messages[2].args[2], RawArg::Float(0.25));
        assert_eq!(messages[3].args[2], RawArg::Float(0.8));
        assert_eq!(messages[4].args[2], RawArg::Int(4));
    }

    #[test]
    fn only_overridden_envelope_fields_are_sent() {
        let env = EnvelopeParams {
            attack: 20.0,
            decay: USE_ENGINE_DEFAULT,
            sustain: 500.0,
            release: USE_ENGINE_DEFAULT,
            reverb: 30.0,
        };
        let messages = compose(&request(env), NodeId::new(11), &routing());
        assert_eq!(
            controls(&messages),
            vec!["freq", "duration", "mul", "effectBus", "attack", "sustain", "reverb"]
        );
        assert_eq!(messages[5].args[2], RawArg::Float(0.02));
        assert_eq!(messages[6].args[2], RawArg::Float(0.5));
        assert_eq!(messages[7].args[2], RawArg::Float(0.3));
    }

    #[test]
    fn full_envelope_order() {
        let env = EnvelopeParams {
            attack: 1.0,
            decay: 2.0,
            sustain: 3.0,
            release: 4.0,
            reverb: 0.0,
        };
        let messages = compose(&request(env), NodeId::new(3), &routing());
        assert_eq!(
            &controls(&messages)[4..],
            &["attack", "decay", "sustain", "release", "reverb"]
        );
        assert_eq!(messages.last().map(|m| m.args[2].clone()), Some(RawArg::Float(0.0)));
    }

    #[test]
    fn effect_setup_creates_then_routes() {
        let messages = compose_effect_setup(NodeId::new(5), BusId::new(7));
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0].args,
            vec![
                RawArg::Str("reverb".into()),
                RawArg::Int(5),
                RawArg::Int(ADD_TO_HEAD),
                RawArg::Int(DEFAULT_GROUP),
            ]
        );
        assert_eq!(messages[1].control_name(), Some("inBus"));
        assert_eq!(messages[1].args[2], RawArg::Int(7));
    }
}
