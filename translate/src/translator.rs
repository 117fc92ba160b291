//! Argument/option translation.
//!
//! [`Translator::translate`] turns a raw call (`Vec<Value>`) into the final
//! argument list for a command body. The last argument decides how options
//! are found, first match wins:
//!
//! 1. a single string argument is shell-split and option-parsed; its
//!    leftovers become the positional arguments
//! 2. with several arguments, a trailing string is whitespace-split and
//!    option-parsed; its leftovers are appended to the others
//! 3. too few arguments, or a variadic command whose last argument is not a
//!    mapping, gets the defaults of an empty parse
//! 4. anything else (exact arity, or a mapping already supplied) is left
//!    alone
//!
//! When options were parsed, missing positional arguments are filled from
//! declared defaults and the options mapping is appended as the final
//! argument.

use invocation_core::{CommandDescriptor, OptionMap};
use invocation_options::{ParseMode, looks_like_flag, split, split_whitespace};
use serde_json::Value;
use tracing::debug;

use crate::cache::ParserCache;
use crate::error::{BoxError, ExpectedArity, TranslateError};
use crate::globals::GlobalOptions;

/// The object a command is invoked on.
///
/// Descriptors with contextual defaults hand their default expressions to
/// [`evaluate`](Target::evaluate); the default implementation refuses.
pub trait Target {
    fn evaluate(&self, expression: &str) -> Result<Value, BoxError> {
        Err(format!("no context to evaluate default expression {expression:?}").into())
    }
}

impl Target for () {}

/// Successful translation.
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    /// Arguments are ready for the command body.
    Ready(ParsedInvocation),
    /// The caller asked for help; the body must not run.
    Help(GlobalOptions),
}

/// Final arguments of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInvocation {
    /// Positional arguments, ending with the options mapping when
    /// [`options_parsed`](Self::options_parsed) is set.
    pub args: Vec<Value>,
    /// Global options given with this call.
    pub globals: GlobalOptions,
    /// Whether option parsing produced the trailing mapping.
    pub options_parsed: bool,
}

impl ParsedInvocation {
    /// The options mapping produced by option parsing, if any.
    pub fn options(&self) -> Option<&OptionMap> {
        if !self.options_parsed {
            return None;
        }
        self.args.last().and_then(Value::as_object)
    }
}

/// Outcome of the option-parse sub-protocol.
enum Extracted {
    Options(OptionMap),
    Help,
}

/// Translates raw calls against command descriptors.
///
/// Holds the [`ParserCache`]; global options are per call and passed back
/// in the result, never stored here.
#[derive(Debug, Default)]
pub struct Translator {
    cache: ParserCache,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &ParserCache {
        &self.cache
    }

    /// Translates `args` for `command`.
    ///
    /// # Errors
    ///
    /// [`TranslateError::Arity`] when the final count does not fit,
    /// [`TranslateError::OptionParse`] for malformed flags, and
    /// [`TranslateError::Translation`] for anything else.
    pub fn translate<T>(
        &self,
        target: &T,
        command: &CommandDescriptor,
        args: Vec<Value>,
    ) -> Result<Translation, TranslateError>
    where
        T: Target + ?Sized,
    {
        let mut globals = GlobalOptions::default();
        self.translate_into(target, command, args, &mut globals)
    }

    /// Like [`translate`](Self::translate), but records the global options
    /// in `globals` as soon as they are known, so a caller can still see
    /// `debug` when translation later fails. `globals` is reset first.
    pub fn translate_into<T>(
        &self,
        target: &T,
        command: &CommandDescriptor,
        mut args: Vec<Value>,
        globals: &mut GlobalOptions,
    ) -> Result<Translation, TranslateError>
    where
        T: Target + ?Sized,
    {
        *globals = GlobalOptions::default();

        if !command.accepts_options() {
            check_supplied_arity(command, &args)?;
            return Ok(ready(args, globals.clone(), false));
        }

        let Some(extracted) = self.command_options(command, &mut args, globals)? else {
            debug!(command = %command.name, "arguments used as given");
            check_supplied_arity(command, &args)?;
            return Ok(ready(args, globals.clone(), false));
        };

        let options = match extracted {
            Extracted::Help => return Ok(Translation::Help(globals.clone())),
            Extracted::Options(options) => options,
        };

        add_default_args(target, command, &mut args)?;
        args.push(Value::Object(options));
        check_arity(command, &args)?;

        Ok(ready(args, globals.clone(), true))
    }

    /// Picks the translation branch and runs the option-parse sub-protocol,
    /// rewriting `args` with the leftover positional tokens. `None` means
    /// the arguments are used as given.
    fn command_options(
        &self,
        command: &CommandDescriptor,
        args: &mut Vec<Value>,
        globals: &mut GlobalOptions,
    ) -> Result<Option<Extracted>, TranslateError> {
        let arity = command.arity();

        if let [Value::String(line)] = args.as_slice() {
            let tokens = split(line).map_err(TranslateError::wrap)?;
            debug!(command = %command.name, ?tokens, "parsing single string argument");
            let Some((options, positional)) = self.parse_options(command, tokens, globals)? else {
                return Ok(Some(Extracted::Help));
            };
            *args = positional.into_iter().map(Value::String).collect();
            return Ok(Some(Extracted::Options(options)));
        }

        if args.len() > 1
            && let Some(Value::String(line)) = args.last()
        {
            let tokens = split_whitespace(line);
            args.pop();
            debug!(command = %command.name, ?tokens, "parsing trailing string argument");
            let Some((options, positional)) = self.parse_options(command, tokens, globals)? else {
                return Ok(Some(Extracted::Help));
            };
            args.extend(positional.into_iter().map(Value::String));
            return Ok(Some(Extracted::Options(options)));
        }

        let last_is_mapping = matches!(args.last(), Some(Value::Object(_)));
        if args.len() < arity || (command.is_variadic() && !last_is_mapping) {
            // an empty parse never yields positional tokens
            let extracted = match self.parse_options(command, Vec::new(), globals)? {
                Some((options, _)) => Extracted::Options(options),
                None => Extracted::Help,
            };
            return Ok(Some(extracted));
        }

        Ok(None)
    }

    /// The option-parse sub-protocol: command-local options, then global
    /// options from the leading tokens, then the nested `global` string.
    ///
    /// Returns the local options and the positional leftovers, or `None`
    /// when help was requested.
    fn parse_options(
        &self,
        command: &CommandDescriptor,
        tokens: Vec<String>,
        globals: &mut GlobalOptions,
    ) -> Result<Option<(OptionMap, Vec<String>)>, TranslateError> {
        let local = self.cache.command_parser(command).map_err(TranslateError::wrap)?;
        let global = self.cache.global_parser(command).map_err(TranslateError::wrap)?;

        let global_names: Vec<&str> = global.schema().specs().iter().map(|spec| spec.name.as_str()).collect();
        let local_mode = ParseMode::lenient().with_reserved(&global_names);
        let (options, leading, trailing) = local.parse(&tokens, local_mode)?.into_parts();
        let (mut global_options, global_leading, global_trailing) =
            global.parse(&leading, ParseMode::lenient())?.into_parts();

        let mut positional: Vec<String> = global_leading
            .into_iter()
            .filter(|token| {
                let keep = !looks_like_flag(token);
                if !keep {
                    debug!(token = %token, "dropped unrecognized global option");
                }
                keep
            })
            .collect();
        positional.extend(global_trailing);
        positional.extend(trailing);

        if let Some(Value::String(nested)) = global_options.get("global").cloned() {
            let nested_tokens: Vec<String> = split(&nested)
                .map_err(TranslateError::wrap)?
                .into_iter()
                .map(|token| {
                    if token.chars().count() > 1 {
                        format!("--{token}")
                    } else {
                        format!("-{token}")
                    }
                })
                .collect();
            debug!(tokens = ?nested_tokens, "parsing nested global options");
            let nested_options = global.parse(&nested_tokens, ParseMode::lenient())?;
            let defaults = global.schema().defaults();
            for (key, value) in nested_options.options() {
                // defaults from the nested parse must not clobber explicit flags
                if defaults.get(key) != Some(value) || !global_options.contains_key(key) {
                    global_options.insert(key.clone(), value.clone());
                }
            }
        }

        *globals = GlobalOptions::from_map(global_options);
        if globals.help() {
            debug!(command = %command.name, "help requested");
            return Ok(None);
        }

        Ok(Some((options, positional)))
    }
}

fn ready(args: Vec<Value>, globals: GlobalOptions, options_parsed: bool) -> Translation {
    Translation::Ready(ParsedInvocation {
        args,
        globals,
        options_parsed,
    })
}

/// Fills unsupplied positions from declared defaults, never touching the
/// final slot reserved for the options mapping. Stops at the first
/// parameter without a default.
fn add_default_args<T>(target: &T, command: &CommandDescriptor, args: &mut Vec<Value>) -> Result<(), TranslateError>
where
    T: Target + ?Sized,
{
    let arity = command.arity();
    if args.len() + 1 >= arity {
        return Ok(());
    }

    for (index, parameter) in command.parameters[..arity - 1].iter().enumerate() {
        if args.len() > index {
            continue;
        }
        let Some(default) = &parameter.default else {
            break;
        };
        let value = if command.contextual_defaults {
            let expression = match default {
                Value::String(expression) => expression.clone(),
                other => other.to_string(),
            };
            target
                .evaluate(&expression)
                .map_err(|source| TranslateError::default_failed(index + 1, source))?
        } else {
            default.clone()
        };
        debug!(command = %command.name, position = index + 1, %value, "filled default argument");
        args.push(value);
    }

    Ok(())
}

/// Checks the count after the options mapping was appended.
fn check_arity(command: &CommandDescriptor, args: &[Value]) -> Result<(), TranslateError> {
    let arity = command.arity();
    let len = args.len();

    if command.is_variadic() {
        if len + 1 >= arity {
            return Ok(());
        }
        return Err(TranslateError::Arity {
            actual: len - 1,
            expected: ExpectedArity::AtLeast(arity.saturating_sub(2)),
        });
    }

    if len == arity {
        return Ok(());
    }
    let expected = if len > arity { arity } else { arity - 1 };
    Err(TranslateError::Arity {
        actual: len - 1,
        expected: ExpectedArity::Exactly(expected),
    })
}

/// Checks arguments passed through without option parsing.
fn check_supplied_arity(command: &CommandDescriptor, args: &[Value]) -> Result<(), TranslateError> {
    let arity = command.arity();
    let len = args.len();

    if command.is_variadic() {
        let required = arity - 1;
        if len >= required {
            return Ok(());
        }
        return Err(TranslateError::Arity {
            actual: len,
            expected: ExpectedArity::AtLeast(required),
        });
    }

    if len == arity {
        return Ok(());
    }
    Err(TranslateError::Arity {
        actual: len,
        expected: ExpectedArity::Exactly(arity),
    })
}

#[cfg(test)]
mod tests {
    use invocation_core::Parameter;
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> OptionMap {
        value.as_object().cloned().unwrap()
    }

    fn ready_args(translation: Translation) -> Vec<Value> {
        match translation {
            Translation::Ready(parsed) => parsed.args,
            Translation::Help(_) => panic!("unexpected help"),
        }
    }

    fn listing() -> CommandDescriptor {
        CommandDescriptor::new("list")
            .with_parameter(Parameter::required("dir"))
            .with_parameter(Parameter::optional("options", json!({})))
            .with_options(map(json!({"limit": 10, "all": "boolean"})))
    }

    struct Session;

    impl Target for Session {
        fn evaluate(&self, expression: &str) -> Result<Value, BoxError> {
            match expression {
                "$user" => Ok(json!("alice")),
                other => Err(format!("undefined {other}").into()),
            }
        }
    }

    #[test]
    fn test_command_without_options_passes_through() {
        let translator = Translator::new();
        let cmd = CommandDescriptor::new("add")
            .with_parameter(Parameter::required("a"))
            .with_parameter(Parameter::required("b"));

        let args = ready_args(translator.translate(&(), &cmd, vec![json!(1), json!(2)]).unwrap());
        assert_eq!(args, vec![json!(1), json!(2)]);

        let err = translator.translate(&(), &cmd, vec![json!(1)]).unwrap_err();
        assert_eq!(err.to_string(), "wrong number of arguments (1 for 2)");
    }

    #[test]
    fn test_single_string_is_split_and_parsed() {
        let translator = Translator::new();
        let args = ready_args(
            translator
                .translate(&(), &listing(), vec![json!("'my dir' --limit=3 -a")])
                .unwrap(),
        );
        assert_eq!(args, vec![json!("my dir"), json!({"limit": 3, "all": true})]);
    }

    #[test]
    fn test_trailing_string_is_parsed_after_other_args() {
        let translator = Translator::new();
        let cmd = CommandDescriptor::new("copy")
            .with_parameter(Parameter::required("from"))
            .with_parameter(Parameter::required("to"))
            .with_parameter(Parameter::optional("options", json!({})))
            .with_options(map(json!({"force": "boolean"})));

        let args = ready_args(
            translator
                .translate(&(), &cmd, vec![json!("a"), json!("b --force")])
                .unwrap(),
        );
        assert_eq!(args, vec![json!("a"), json!("b"), json!({"force": true})]);
    }

    #[test]
    fn test_missing_args_get_empty_parse_defaults() {
        let translator = Translator::new();
        let cmd = CommandDescriptor::new("status")
            .with_parameter(Parameter::optional("options", json!({})))
            .with_options(map(json!({"limit": 10})));

        let args = ready_args(translator.translate(&(), &cmd, Vec::new()).unwrap());
        assert_eq!(args, vec![json!({"limit": 10})]);
    }

    #[test]
    fn test_explicit_mapping_is_left_alone() {
        let translator = Translator::new();
        let given = vec![json!("dir"), json!({"limit": 1})];
        let translation = translator.translate(&(), &listing(), given.clone()).unwrap();
        match translation {
            Translation::Ready(parsed) => {
                assert_eq!(parsed.args, given);
                assert!(!parsed.options_parsed);
                assert!(parsed.options().is_none());
            }
            Translation::Help(_) => panic!("unexpected help"),
        }
    }

    #[test]
    fn test_defaults_fill_missing_positions() {
        let translator = Translator::new();
        let cmd = CommandDescriptor::new("fetch")
            .with_parameter(Parameter::required("url"))
            .with_parameter(Parameter::optional("retries", json!(3)))
            .with_parameter(Parameter::optional("options", json!({})))
            .with_options(map(json!({"quiet": "boolean"})));

        let args = ready_args(translator.translate(&(), &cmd, vec![json!("host")]).unwrap());
        assert_eq!(args, vec![json!("host"), json!(3), json!({})]);
    }

    #[test]
    fn test_too_many_positionals_reports_arity() {
        let translator = Translator::new();
        let cmd = CommandDescriptor::new("fetch")
            .with_parameter(Parameter::required("url"))
            .with_parameter(Parameter::optional("retries", json!(3)))
            .with_parameter(Parameter::optional("options", json!({})))
            .with_options(map(json!({"quiet": "boolean"})));

        let err = translator.translate(&(), &cmd, vec![json!("a b c d")]).unwrap_err();
        assert!(matches!(
            err,
            TranslateError::Arity {
                actual: 4,
                expected: ExpectedArity::Exactly(3)
            }
        ));
        assert_eq!(err.to_string(), "wrong number of arguments (4 for 3)");
    }

    #[test]
    fn test_help_flag_short_circuits() {
        let translator = Translator::new();
        let translation = translator.translate(&(), &listing(), vec![json!("--help dir")]).unwrap();
        assert!(matches!(translation, Translation::Help(globals) if globals.help()));
    }

    #[test]
    fn test_global_names_are_not_abbreviations_of_local_options() {
        let translator = Translator::new();
        let cmd = CommandDescriptor::new("build")
            .with_parameter(Parameter::optional("options", json!({})))
            .with_options(map(json!({"helper": "string", "debug_level": 1})));

        let translation = translator.translate(&(), &cmd, vec![json!("--help")]).unwrap();
        assert!(matches!(translation, Translation::Help(globals) if globals.help()));

        let Translation::Ready(parsed) = translator.translate(&(), &cmd, vec![json!("--debug --helper=x")]).unwrap()
        else {
            panic!("unexpected help");
        };
        assert!(parsed.globals.debug());
        assert_eq!(parsed.args, vec![json!({"helper": "x", "debug_level": 1})]);
    }

    #[test]
    fn test_non_string_positional_gets_defaults_and_empty_parse() {
        let translator = Translator::new();
        let cmd = CommandDescriptor::new("fetch")
            .with_parameter(Parameter::required("url"))
            .with_parameter(Parameter::optional("retries", json!(3)))
            .with_parameter(Parameter::optional("options", json!({})))
            .with_options(map(json!({"quiet": "boolean"})));

        let translation = translator.translate(&(), &cmd, vec![json!(1)]).unwrap();
        let Translation::Ready(parsed) = translation else {
            panic!("unexpected help");
        };
        assert!(parsed.options_parsed);
        assert_eq!(parsed.args, vec![json!(1), json!(3), json!({})]);
    }

    #[test]
    fn test_global_flags_are_separated_from_local_options() {
        let translator = Translator::new();
        let translation = translator
            .translate(&(), &listing(), vec![json!("--render --fields=a,b dir -l 2")])
            .unwrap();
        let Translation::Ready(parsed) = translation else {
            panic!("unexpected help");
        };
        assert_eq!(parsed.args, vec![json!("dir"), json!({"limit": 2})]);
        assert_eq!(parsed.globals.render(), Some(true));
        assert_eq!(
            parsed.globals.render_options().fields,
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_nested_global_string() {
        let translator = Translator::new();
        let translation = translator
            .translate(&(), &listing(), vec![json!("--global 'render as=json' dir")])
            .unwrap();
        let Translation::Ready(parsed) = translation else {
            panic!("unexpected help");
        };
        assert_eq!(parsed.globals.render(), Some(true));
        assert_eq!(parsed.globals.render_options().format.as_deref(), Some("json"));
        assert_eq!(parsed.args, vec![json!("dir"), json!({"limit": 10})]);
    }

    #[test]
    fn test_unknown_global_flags_are_dropped() {
        let translator = Translator::new();
        let args = ready_args(
            translator
                .translate(&(), &listing(), vec![json!("--bogus dir")])
                .unwrap(),
        );
        assert_eq!(args, vec![json!("dir"), json!({"limit": 10})]);
    }

    #[test]
    fn test_variadic_arity() {
        let translator = Translator::new();
        let cmd = CommandDescriptor::new("echo")
            .with_parameter(Parameter::required("first"))
            .with_parameter(Parameter::splat("rest"))
            .with_parameter(Parameter::optional("options", json!({})))
            .with_options(map(json!({"upcase": "boolean"})));

        let args = ready_args(
            translator
                .translate(&(), &cmd, vec![json!("a b c --upcase")])
                .unwrap(),
        );
        assert_eq!(args, vec![json!("a"), json!("b"), json!("c"), json!({"upcase": true})]);

        let err = translator.translate(&(), &cmd, vec![json!("--upcase")]).unwrap_err();
        assert_eq!(err.to_string(), "wrong number of arguments (0 for 1+)");
    }

    #[test]
    fn test_contextual_defaults_use_target() {
        let translator = Translator::new();
        let cmd = CommandDescriptor::new("greet")
            .with_parameter(Parameter::optional("name", json!("$user")))
            .with_parameter(Parameter::optional("options", json!({})))
            .with_options(map(json!({"shout": "boolean"})))
            .with_contextual_defaults();

        let args = ready_args(translator.translate(&Session, &cmd, vec![json!("--shout")]).unwrap());
        assert_eq!(args, vec![json!("alice"), json!({"shout": true})]);

        let err = translator.translate(&(), &cmd, vec![json!("--shout")]).unwrap_err();
        assert!(matches!(err, TranslateError::Translation { .. }));
        assert!(
            err.to_string()
                .starts_with("unable to set default argument at position 1")
        );
    }

    #[test]
    fn test_debug_is_recorded_before_failure() {
        let translator = Translator::new();
        let mut globals = GlobalOptions::default();
        let result = translator.translate_into(&(), &listing(), vec![json!("--debug a b c")], &mut globals);
        assert!(matches!(result, Err(TranslateError::Arity { .. })));
        assert!(globals.debug());
    }

    #[test]
    fn test_malformed_input_errors() {
        let translator = Translator::new();
        let err = translator
            .translate(&(), &listing(), vec![json!("dir 'unterminated")])
            .unwrap_err();
        assert!(matches!(err, TranslateError::Translation { source: Some(_), .. }));

        let err = translator
            .translate(&(), &listing(), vec![json!("dir --limit=abc")])
            .unwrap_err();
        assert!(matches!(err, TranslateError::OptionParse(_)));
    }
}
