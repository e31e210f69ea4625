//! Play-argument interpreter.
//!
//! A play call hands over an untyped list in one of two shapes:
//!
//! - note-name form: `[token, octave, duration_ms?, volume_percent?]`
//! - frequency form: `[hertz, duration_ms?, volume_percent?]`
//!
//! [`classify`] decides the shape and extracts each field, recording fields it
//! could not read as [`Field::Unresolved`]. Once one optional field fails to
//! parse, every later optional field is left unresolved too, so a malformed
//! duration still plays the note with default duration and volume.
//! [`ParsedArgs::resolve`] then fills in defaults and computes the frequency.

use timbre_types::{
    ArgValue, Diagnostic, DiagnosticCode, DiagnosticSink, EnvelopeParams, NoteSpecifier, NoteToken,
    NumericError, PlayRequest, Severity, DEFAULT_DURATION_MS, DEFAULT_VOLUME_PERCENT,
    REFERENCE_OCTAVE,
};

/// Elements consumed in note-name form.
pub const NOTE_FORM_ARGS: usize = 4;
/// Elements consumed in frequency form.
pub const FREQUENCY_FORM_ARGS: usize = 3;

/// A field that was either read from the argument list or left for a default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<T> {
    Supplied(T),
    Unresolved,
}

impl<T: Copy> Field<T> {
    pub fn or(self, default: T) -> T {
        match self {
            Field::Supplied(v) => v,
            Field::Unresolved => default,
        }
    }

    pub fn is_supplied(&self) -> bool {
        matches!(self, Field::Supplied(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedArgs {
    NoteForm {
        token: NoteToken,
        octave: Field<i32>,
        duration_ms: Field<f32>,
        volume_percent: Field<f32>,
    },
    FrequencyForm {
        hertz: f32,
        duration_ms: Field<f32>,
        volume_percent: Field<f32>,
    },
}

/// The request was discarded; nothing is played.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub code: DiagnosticCode,
    pub detail: String,
}

impl ParseFailure {
    fn new(code: DiagnosticCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(
            Severity::Error,
            self.code,
            format!("canceling play operation: {}", self.detail),
        )
    }
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.detail)
    }
}

impl std::error::Error for ParseFailure {}

/// Successful classification plus any non-fatal diagnostics raised on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub parsed: ParsedArgs,
    pub notes: Vec<Diagnostic>,
}

/// Walks the optional tail of the argument list. After the first
/// unparseable element, nothing further is consumed.
struct OptionalChain<'a> {
    args: &'a [ArgValue],
    broken: bool,
    notes: Vec<Diagnostic>,
}

impl<'a> OptionalChain<'a> {
    fn new(args: &'a [ArgValue]) -> Self {
        Self {
            args,
            broken: false,
            notes: Vec::new(),
        }
    }

    fn format_failure(&mut self, index: usize, text: &str) {
        self.broken = true;
        self.notes.push(Diagnostic::new(
            Severity::Warning,
            DiagnosticCode::NumberFormat,
            format!(
                "skipped remaining list elements: element {} ({:?}) is not a number",
                index, text
            ),
        ));
    }

    fn float(&mut self, index: usize) -> Result<Field<f32>, ParseFailure> {
        if self.broken {
            return Ok(Field::Unresolved);
        }
        let Some(arg) = self.args.get(index) else {
            return Ok(Field::Unresolved);
        };
        match arg.to_f32() {
            Ok(v) if v.is_finite() => Ok(Field::Supplied(v)),
            Ok(v) => {
                self.format_failure(index, &v.to_string());
                Ok(Field::Unresolved)
            }
            Err(NumericError::Format(text)) => {
                self.format_failure(index, &text);
                Ok(Field::Unresolved)
            }
            Err(NumericError::WrongType(kind)) => Err(wrong_type(index, kind)),
        }
    }

    fn int(&mut self, index: usize) -> Result<Field<i32>, ParseFailure> {
        if self.broken {
            return Ok(Field::Unresolved);
        }
        let Some(arg) = self.args.get(index) else {
            return Ok(Field::Unresolved);
        };
        match arg.to_i32() {
            Ok(v) => Ok(Field::Supplied(v)),
            Err(NumericError::Format(text)) => {
                self.format_failure(index, &text);
                Ok(Field::Unresolved)
            }
            Err(NumericError::WrongType(kind)) => Err(wrong_type(index, kind)),
        }
    }

    /// Duration, with negative values raised to zero.
    fn duration(&mut self, index: usize) -> Result<Field<f32>, ParseFailure> {
        let field = self.float(index)?;
        if let Field::Supplied(ms) = field {
            if ms < 0.0 {
                self.notes.push(Diagnostic::new(
                    Severity::Warning,
                    DiagnosticCode::NegativeDuration,
                    format!("duration {} ms raised to 0", ms),
                ));
                return Ok(Field::Supplied(0.0));
            }
        }
        Ok(field)
    }
}

fn wrong_type(index: usize, kind: &str) -> ParseFailure {
    ParseFailure::new(
        DiagnosticCode::UnexpectedType,
        format!("element {} has unexpected type {}", index, kind),
    )
}

fn excess_note(expected: usize, received: usize) -> Diagnostic {
    Diagnostic::new(
        Severity::Warning,
        DiagnosticCode::ExcessArguments,
        format!(
            "expected a {} element list but received {} elements; extra elements ignored",
            expected, received
        ),
    )
}

/// Decide which form `args` is in and extract its fields.
pub fn classify(args: &[ArgValue]) -> Result<Classified, ParseFailure> {
    let first = args
        .first()
        .ok_or_else(|| ParseFailure::new(DiagnosticCode::MissingPitch, "empty argument list"))?;

    if let Some(token) = first.as_text().and_then(NoteToken::parse) {
        log::debug!(target: "timbre::interp", "received play instruction in note-letter format");
        if args.len() < 2 {
            return Err(ParseFailure::new(
                DiagnosticCode::MissingOctave,
                format!("no octave supplied for note {}", token),
            ));
        }
        let mut chain = OptionalChain::new(args);
        let octave = chain.int(1)?;
        let duration_ms = chain.duration(2)?;
        let volume_percent = chain.float(3)?;
        let mut notes = chain.notes;
        if args.len() > NOTE_FORM_ARGS {
            notes.push(excess_note(NOTE_FORM_ARGS, args.len()));
        }
        return Ok(Classified {
            parsed: ParsedArgs::NoteForm {
                token,
                octave,
                duration_ms,
                volume_percent,
            },
            notes,
        });
    }

    log::debug!(target: "timbre::interp", "received play instruction in frequency format");
    let hertz = match first.to_f32() {
        Ok(hz) if hz.is_finite() && hz > 0.0 => hz,
        Ok(hz) => {
            return Err(ParseFailure::new(
                DiagnosticCode::InvalidFrequency,
                format!("frequency must be a positive number of hertz, got {}", hz),
            ))
        }
        Err(NumericError::Format(text)) => {
            return Err(ParseFailure::new(
                DiagnosticCode::InvalidFrequency,
                format!("{:?} is neither a note name nor a frequency", text),
            ))
        }
        Err(NumericError::WrongType(kind)) => return Err(wrong_type(0, kind)),
    };
    let mut chain = OptionalChain::new(args);
    let duration_ms = chain.duration(1)?;
    let volume_percent = chain.float(2)?;
    let mut notes = chain.notes;
    if args.len() > FREQUENCY_FORM_ARGS {
        notes.push(excess_note(FREQUENCY_FORM_ARGS, args.len()));
    }
    Ok(Classified {
        parsed: ParsedArgs::FrequencyForm {
            hertz,
            duration_ms,
            volume_percent,
        },
        notes,
    })
}

impl ParsedArgs {
    /// The pitch this request names. An unresolved octave becomes
    /// [`REFERENCE_OCTAVE`].
    pub fn pitch(&self) -> NoteSpecifier {
        match *self {
            ParsedArgs::NoteForm { token, octave, .. } => NoteSpecifier::NoteName {
                token,
                octave: octave.or(REFERENCE_OCTAVE),
            },
            ParsedArgs::FrequencyForm { hertz, .. } => NoteSpecifier::Frequency { hertz },
        }
    }

    fn optional_fields(&self) -> (Field<f32>, Field<f32>) {
        match *self {
            ParsedArgs::NoteForm {
                duration_ms,
                volume_percent,
                ..
            }
            | ParsedArgs::FrequencyForm {
                duration_ms,
                volume_percent,
                ..
            } => (duration_ms, volume_percent),
        }
    }

    /// Fill unresolved fields with defaults and attach the envelope.
    pub fn resolve(&self, envelope: EnvelopeParams) -> Result<PlayRequest, ParseFailure> {
        let pitch = self.pitch();
        let frequency_hz = pitch.hertz().ok_or_else(|| {
            ParseFailure::new(DiagnosticCode::UnknownNote, format!("no frequency for {}", pitch))
        })?;
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return Err(ParseFailure::new(
                DiagnosticCode::InvalidFrequency,
                format!("{} is out of range", pitch),
            ));
        }
        let (duration_ms, volume_percent) = self.optional_fields();
        Ok(PlayRequest {
            frequency_hz,
            duration_ms: duration_ms.or(DEFAULT_DURATION_MS),
            volume_percent: volume_percent.or(DEFAULT_VOLUME_PERCENT),
            envelope,
        })
    }
}

/// Turn a raw argument list into a play request, reporting every
/// diagnostic to `sink`. The list is never modified.
pub fn interpret(
    args: &[ArgValue],
    envelope: EnvelopeParams,
    sink: &dyn DiagnosticSink,
) -> Result<PlayRequest, ParseFailure> {
    let result = classify(args).and_then(|classified| {
        for note in classified.notes {
            sink.emit(note);
        }
        classified.parsed.resolve(envelope)
    });
    if let Err(ref failure) = result {
        sink.emit(failure.to_diagnostic());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;

    fn args(items: Vec<ArgValue>) -> Vec<ArgValue> {
        items
    }

    fn run(list: &[ArgValue]) -> (Result<PlayRequest, ParseFailure>, MemorySink) {
        let sink = MemorySink::new();
        let result = interpret(list, EnvelopeParams::default(), &sink);
        (result, sink)
    }

    #[test]
    fn note_form_with_defaults() {
        let (result, sink) = run(&args(vec!["a".into(), 4.into()]));
        let req = result.unwrap();
        assert_eq!(req.frequency_hz, 440.0);
        assert_eq!(req.duration_ms, DEFAULT_DURATION_MS);
        assert_eq!(req.volume_percent, DEFAULT_VOLUME_PERCENT);
        assert!(sink.is_empty());
    }

    #[test]
    fn note_form_all_fields() {
        let (result, _) = run(&args(vec!["C#".into(), "5".into(), "250".into(), 80.into()]));
        let req = result.unwrap();
        assert_eq!(req.frequency_hz, (277.183f32 as f64 * 2.0) as f32);
        assert_eq!(req.duration_ms, 250.0);
        assert_eq!(req.volume_percent, 80.0);
    }

    #[test]
    fn missing_octave_discards_request() {
        let (result, sink) = run(&args(vec!["g".into()]));
        assert_eq!(result.unwrap_err().code, DiagnosticCode::MissingOctave);
        assert_eq!(sink.codes(), vec![DiagnosticCode::MissingOctave]);
    }

    #[test]
    fn empty_list_discards_request() {
        let (result, _) = run(&[]);
        assert_eq!(result.unwrap_err().code, DiagnosticCode::MissingPitch);
    }

    #[test]
    fn malformed_duration_falls_back_for_rest() {
        let (result, sink) = run(&args(vec![440.into(), "bad".into(), 50.into()]));
        let req = result.unwrap();
        assert_eq!(req.frequency_hz, 440.0);
        assert_eq!(req.duration_ms, DEFAULT_DURATION_MS);
        assert_eq!(req.volume_percent, DEFAULT_VOLUME_PERCENT);
        assert_eq!(sink.codes(), vec![DiagnosticCode::NumberFormat]);
    }

    #[test]
    fn malformed_volume_keeps_duration() {
        let (result, _) = run(&args(vec![
            "e".into(),
            3.into(),
            "120".into(),
            "loud".into(),
        ]));
        let req = result.unwrap();
        assert_eq!(req.duration_ms, 120.0);
        assert_eq!(req.volume_percent, DEFAULT_VOLUME_PERCENT);
    }

    #[test]
    fn unparseable_octave_uses_reference_and_stops() {
        let (result, sink) = run(&args(vec!["a".into(), "x".into(), 100.into(), 90.into()]));
        let req = result.unwrap();
        assert_eq!(req.frequency_hz, 440.0);
        assert_eq!(req.duration_ms, DEFAULT_DURATION_MS);
        assert_eq!(req.volume_percent, DEFAULT_VOLUME_PERCENT);
        assert_eq!(sink.codes(), vec![DiagnosticCode::NumberFormat]);
    }

    #[test]
    fn elements_after_a_format_failure_are_not_inspected() {
        let (result, _) = run(&args(vec![440.into(), "bad".into(), ArgValue::Bool(true)]));
        assert!(result.is_ok());
    }

    #[test]
    fn wrong_type_aborts_even_when_optional() {
        let (result, sink) = run(&args(vec![440.into(), ArgValue::Nil]));
        assert_eq!(result.unwrap_err().code, DiagnosticCode::UnexpectedType);
        assert!(sink.contains(DiagnosticCode::UnexpectedType));

        let (result, _) = run(&args(vec!["a".into(), ArgValue::List(vec![])]));
        assert_eq!(result.unwrap_err().code, DiagnosticCode::UnexpectedType);
    }

    #[test]
    fn wrong_type_pitch_aborts() {
        let (result, _) = run(&args(vec![ArgValue::Bool(false), 4.into()]));
        assert_eq!(result.unwrap_err().code, DiagnosticCode::UnexpectedType);
    }

    #[test]
    fn non_numeric_frequency_text_aborts() {
        let (result, _) = run(&args(vec!["x4".into()]));
        assert_eq!(result.unwrap_err().code, DiagnosticCode::InvalidFrequency);
    }

    #[test]
    fn non_positive_frequency_aborts() {
        for hz in [0.0, -220.0] {
            let (result, _) = run(&args(vec![ArgValue::Float(hz)]));
            assert_eq!(result.unwrap_err().code, DiagnosticCode::InvalidFrequency);
        }
    }

    #[test]
    fn frequency_text_is_accepted() {
        let (result, _) = run(&args(vec![" 261.5 ".into()]));
        assert_eq!(result.unwrap().frequency_hz, 261.5);
    }

    #[test]
    fn excess_arguments_are_ignored_with_notice() {
        let (result, sink) = run(&args(vec![
            "b".into(),
            4.into(),
            100.into(),
            20.into(),
            "extra".into(),
        ]));
        let req = result.unwrap();
        assert_eq!(req.volume_percent, 20.0);
        assert_eq!(sink.codes(), vec![DiagnosticCode::ExcessArguments]);

        let (_, sink) = run(&args(vec![440.into(), 1.into(), 2.into(), 3.into()]));
        assert_eq!(sink.codes(), vec![DiagnosticCode::ExcessArguments]);
    }

    #[test]
    fn negative_duration_is_raised_to_zero() {
        let (result, sink) = run(&args(vec![440.into(), (-10).into()]));
        assert_eq!(result.unwrap().duration_ms, 0.0);
        assert!(sink.contains(DiagnosticCode::NegativeDuration));
    }

    #[test]
    fn volume_is_not_clamped() {
        let (result, _) = run(&args(vec![440.into(), 100.into(), 250.into()]));
        assert_eq!(result.unwrap().volume_percent, 250.0);
    }

    #[test]
    fn enharmonic_requests_match() {
        let (x, _) = run(&args(vec!["b#".into(), 4.into()]));
        let (y, _) = run(&args(vec!["c".into(), 4.into()]));
        assert_eq!(x.unwrap().frequency_hz, y.unwrap().frequency_hz);
    }

    #[test]
    fn extreme_octave_is_rejected() {
        let (result, _) = run(&args(vec!["a".into(), 1000.into()]));
        assert_eq!(result.unwrap_err().code, DiagnosticCode::InvalidFrequency);
    }

    #[test]
    fn pitch_names_what_resolve_plays() {
        let parsed = classify(&args(vec!["f#".into(), "x".into()])).unwrap().parsed;
        let token = NoteToken::parse("f#").unwrap();
        assert_eq!(
            parsed.pitch(),
            NoteSpecifier::NoteName {
                token,
                octave: REFERENCE_OCTAVE
            }
        );
        let req = parsed.resolve(EnvelopeParams::default()).unwrap();
        assert_eq!(Some(req.frequency_hz), parsed.pitch().hertz());

        let parsed = classify(&args(vec![330.into(), 100.into()])).unwrap().parsed;
        assert_eq!(parsed.pitch(), NoteSpecifier::Frequency { hertz: 330.0 });
        assert_eq!(parsed.resolve(EnvelopeParams::default()).unwrap().frequency_hz, 330.0);
    }

    #[test]
    fn classify_marks_unresolved_fields() {
        let classified = classify(&args(vec!["d".into(), 2.into(), "?".into()])).unwrap();
        match classified.parsed {
            ParsedArgs::NoteForm {
                octave,
                duration_ms,
                volume_percent,
                ..
            } => {
                assert_eq!(octave, Field::Supplied(2));
                assert_eq!(duration_ms, Field::Unresolved);
                assert!(!volume_percent.is_supplied());
            }
            other => panic!("expected note form, got {:?}", other),
        }
    }

    #[test]
    fn input_list_is_untouched() {
        let list = args(vec!["a".into(), 4.into(), "bad".into()]);
        let copy = list.clone();
        let _ = run(&list);
        assert_eq!(list, copy);
    }
}
