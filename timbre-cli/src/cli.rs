//! Command-line parsing for the note player.

use timbre_types::ArgValue;

pub const USAGE: &str = "usage: timbre-cli [--verbose|-v] [--dry-run] [--quit] [--source NAME] \
[--attack MS] [--decay MS] [--sustain MS] [--release MS] [--reverb PCT] [--json LIST | ARG...]";

#[derive(Debug, Default, PartialEq)]
pub struct Options {
    pub verbose: bool,
    pub dry_run: bool,
    pub quit: bool,
    pub source: Option<String>,
    pub attack: Option<f32>,
    pub decay: Option<f32>,
    pub sustain: Option<f32>,
    pub release: Option<f32>,
    pub reverb: Option<f32>,
    /// Play arguments, in order. Empty means nothing is played.
    pub play: Vec<ArgValue>,
}

fn value<'a>(flag: &str, it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, String> {
    it.next().ok_or_else(|| format!("{} needs a value", flag))
}

fn number<'a>(flag: &str, it: &mut impl Iterator<Item = &'a String>) -> Result<f32, String> {
    let raw = value(flag, it)?;
    raw.trim()
        .parse::<f32>()
        .map_err(|_| format!("{} expects a number, got {:?}", flag, raw))
}

/// Parse everything after the program name.
///
/// Flags are recognised anywhere until `--`; other words become play
/// arguments. A word starting with `-` followed by a digit is a number, not a
/// flag.
pub fn parse(args: &[String]) -> Result<Options, String> {
    let mut opts = Options::default();
    let mut json: Option<Vec<ArgValue>> = None;
    let mut it = args.iter();
    let mut positional_only = false;

    while let Some(arg) = it.next() {
        if positional_only || !looks_like_flag(arg) {
            opts.play.push(ArgValue::from_word(arg));
            continue;
        }
        match arg.as_str() {
            "--" => positional_only = true,
            "--verbose" | "-v" => opts.verbose = true,
            "--dry-run" => opts.dry_run = true,
            "--quit" => opts.quit = true,
            "--source" => opts.source = Some(value(arg, &mut it)?.clone()),
            "--attack" => opts.attack = Some(number(arg, &mut it)?),
            "--decay" => opts.decay = Some(number(arg, &mut it)?),
            "--sustain" => opts.sustain = Some(number(arg, &mut it)?),
            "--release" => opts.release = Some(number(arg, &mut it)?),
            "--reverb" => opts.reverb = Some(number(arg, &mut it)?),
            "--json" => {
                let raw = value(arg, &mut it)?;
                let list: Vec<ArgValue> = serde_json::from_str(raw)
                    .map_err(|e| format!("--json expects a JSON array: {}", e))?;
                json = Some(list);
            }
            other => return Err(format!("unknown flag {}", other)),
        }
    }

    if let Some(list) = json {
        if !opts.play.is_empty() {
            return Err("--json cannot be combined with positional arguments".to_string());
        }
        opts.play = list;
    }
    Ok(opts)
}

fn looks_like_flag(arg: &str) -> bool {
    let mut chars = arg.chars();
    match (chars.next(), chars.next()) {
        (Some('-'), Some(c)) => !(c.is_ascii_digit() || c == '.'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn positional_words_become_arguments() {
        let opts = parse(&args("a# 3 250 80")).unwrap();
        assert_eq!(
            opts.play,
            vec![
                ArgValue::Text("a#".into()),
                ArgValue::Int(3),
                ArgValue::Int(250),
                ArgValue::Int(80)
            ]
        );
        assert!(!opts.dry_run);
    }

    #[test]
    fn flags_and_properties() {
        let opts = parse(&args(
            "-v --dry-run --source saw --attack 10 --reverb 55.5 --quit 440",
        ))
        .unwrap();
        assert!(opts.verbose && opts.dry_run && opts.quit);
        assert_eq!(opts.source.as_deref(), Some("saw"));
        assert_eq!(opts.attack, Some(10.0));
        assert_eq!(opts.reverb, Some(55.5));
        assert_eq!(opts.decay, None);
        assert_eq!(opts.play, vec![ArgValue::Int(440)]);
    }

    #[test]
    fn negative_numbers_are_not_flags() {
        let opts = parse(&args("440 -20")).unwrap();
        assert_eq!(opts.play, vec![ArgValue::Int(440), ArgValue::Int(-20)]);
    }

    #[test]
    fn json_list_keeps_types() {
        let raw = vec!["--json".to_string(), r#"[440, "bad", 50, true]"#.to_string()];
        let opts = parse(&raw).unwrap();
        assert_eq!(
            opts.play,
            vec![
                ArgValue::Int(440),
                ArgValue::Text("bad".into()),
                ArgValue::Int(50),
                ArgValue::Bool(true)
            ]
        );
    }

    #[test]
    fn unusable_input_is_rejected() {
        assert!(parse(&args("--attack")).is_err());
        assert!(parse(&args("--attack soon")).is_err());
        assert!(parse(&args("--bogus")).is_err());
        assert!(parse(&args("--json [1 a")).is_err());
        let mixed = vec!["--json".to_string(), "[1]".to_string(), "a".to_string()];
        assert!(parse(&mixed).is_err());
    }

    #[test]
    fn double_dash_ends_flags() {
        let opts = parse(&args("-- --quit")).unwrap();
        assert!(!opts.quit);
        assert_eq!(opts.play, vec![ArgValue::Text("--quit".into())]);
    }
}
