//! This module provides the parser for reversible machine descriptions, utilizing the `pest`
//! crate. The grammar lives in `grammar.pest`; this module turns the parse tree into a `Machine`
//! and checks that the declared section sizes match their contents.

use crate::{
    analyzer::analyze,
    types::{Direction, Machine, Quintuple, RtmError, MAX_PROGRAM_SIZE},
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;

/// Derives a `PestParser` for the machine description grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct MachineParser;

/// Parses the given input string into a `Machine`.
///
/// This is the main entry point for parsing machine descriptions. The parsed machine is
/// automatically validated before being returned.
///
/// # Arguments
///
/// * `input` - A string slice containing the machine description.
///
/// # Returns
///
/// * `Ok(Machine)` if the input is successfully parsed and validated.
/// * `Err(RtmError::ParseError)` if there are syntax errors or section counts do not match.
/// * `Err(RtmError::ValidationError)` if the machine fails validation.
pub fn parse(input: &str) -> Result<Machine, RtmError> {
    if input.len() > MAX_PROGRAM_SIZE {
        return Err(RtmError::ValidationError(format!(
            "Machine description is {} bytes, the limit is {}",
            input.len(),
            MAX_PROGRAM_SIZE
        )));
    }

    let root = MachineParser::parse(Rule::machine, input.trim())
        .map_err(|e| RtmError::ParseError(Box::new(e)))?
        .next()
        .ok_or_else(|| RtmError::ValidationError("Empty machine description".to_string()))?;

    let machine = parse_machine(root)?;

    analyze(&machine)?;

    Ok(machine)
}

/// The counts declared on the first line, with their spans for error reporting.
struct Header<'i> {
    counts: [(usize, Span<'i>); 4],
}

/// Parses the top-level structure of a description from a `Pair<Rule::machine>`.
fn parse_machine(pair: Pair<Rule>) -> Result<Machine, RtmError> {
    let mut header: Option<Header> = None;
    let mut states = Vec::new();
    let mut input_alphabet = Vec::new();
    let mut tape_alphabet = Vec::new();
    let mut rules = Vec::new();
    let mut input = String::new();
    let mut section_spans = Vec::new();

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::header => header = Some(parse_header(p)?),
            Rule::states => {
                section_spans.push(p.as_span());
                states = p.into_inner().map(|s| s.as_str().to_string()).collect();
            }
            Rule::input_alphabet => {
                section_spans.push(p.as_span());
                input_alphabet = parse_symbols(p.into_inner());
            }
            Rule::tape_alphabet => {
                section_spans.push(p.as_span());
                tape_alphabet = parse_symbols(p.into_inner());
            }
            Rule::transition => rules.push(parse_transition(p)?),
            Rule::input => input = p.as_str().trim().to_string(),
            _ => {} // EOI
        }
    }

    let header = header
        .ok_or_else(|| RtmError::ValidationError("Missing header line".to_string()))?;

    let found = [
        states.len(),
        input_alphabet.len(),
        tape_alphabet.len(),
        rules.len(),
    ];
    let names = ["states", "input symbols", "tape symbols", "transitions"];
    for (i, ((declared, header_span), found)) in header.counts.iter().zip(found).enumerate() {
        if *declared != found {
            let span = section_spans.get(i).copied().unwrap_or(*header_span);
            return Err(parse_error(
                &format!(
                    "Header declares {} {} but {} were found",
                    declared, names[i], found
                ),
                span,
            ));
        }
    }

    let (start_state, accept_state) = match (states.first(), states.last()) {
        (Some(first), Some(last)) => (first.clone(), last.clone()),
        _ => {
            return Err(RtmError::ValidationError(
                "At least one state is required".to_string(),
            ))
        }
    };

    Ok(Machine {
        states,
        input_alphabet,
        tape_alphabet,
        start_state,
        accept_state,
        rules,
        input,
    })
}

/// Parses the four section counts from a `Pair<Rule::header>`.
fn parse_header(pair: Pair<Rule>) -> Result<Header, RtmError> {
    let mut counts = Vec::with_capacity(4);

    // Rule: header > [count; 4]
    for count_pair in pair.into_inner() {
        let span = count_pair.as_span();
        let value = count_pair
            .as_str()
            .parse::<usize>()
            .map_err(|e| parse_error(&format!("Invalid count: {e}"), span))?;
        counts.push((value, span));
    }

    match counts.as_slice() {
        [a, b, c, d] => Ok(Header {
            counts: [*a, *b, *c, *d],
        }),
        _ => Err(RtmError::ValidationError(
            "Header must contain exactly four counts".to_string(),
        )),
    }
}

/// Parses a single `(q,s)=(q',w,D)` line from a `Pair<Rule::transition>`.
fn parse_transition(pair: Pair<Rule>) -> Result<Quintuple, RtmError> {
    let mut pairs = pair.into_inner();

    let state = parse_string(&mut pairs)?;
    let read = parse_symbol_from_pairs(&mut pairs)?;
    let next_state = parse_string(&mut pairs)?;
    let write = parse_symbol_from_pairs(&mut pairs)?;
    let direction = match pairs.next() {
        Some(p) => parse_direction(p)?,
        None => return Err(RtmError::ValidationError("Missing direction".to_string())),
    };

    Ok(Quintuple {
        state,
        read,
        next_state,
        write,
        direction,
    })
}

/// Parses a single direction from a `Pair<Rule::direction>`.
fn parse_direction(pair: Pair<Rule>) -> Result<Direction, RtmError> {
    let span = pair.as_span();
    match pair.as_str() {
        "L" => Ok(Direction::Left),
        "R" => Ok(Direction::Right),
        other => Err(parse_error(&format!("Unsupported direction: {other}"), span)),
    }
}

/// Collects the symbols of an alphabet line.
fn parse_symbols(pairs: Pairs<Rule>) -> Vec<char> {
    pairs.filter_map(|p| p.as_str().chars().next()).collect()
}

/// Parses a single character symbol from a `Pairs` iterator.
fn parse_symbol_from_pairs(pairs: &mut Pairs<Rule>) -> Result<char, RtmError> {
    parse_string(pairs)?
        .chars()
        .next()
        .ok_or_else(|| RtmError::ValidationError("Empty symbol".to_string()))
}

/// Extracts the string content from the current `Pair` in a `Pairs` iterator.
fn parse_string(pairs: &mut Pairs<Rule>) -> Result<String, RtmError> {
    pairs
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| RtmError::ValidationError("Incomplete transition".to_string()))
}

/// Creates a `RtmError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> RtmError {
    RtmError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flip_machine() {
        let input = "2 2 3 1\n0 1\n0 1\n0 1 B\n(0,0)=(1,1,R)\n0\n";

        let machine = parse(input).unwrap();
        assert_eq!(machine.states, vec!["0", "1"]);
        assert_eq!(machine.input_alphabet, vec!['0', '1']);
        assert_eq!(machine.tape_alphabet, vec!['0', '1', 'B']);
        assert_eq!(machine.start_state, "0");
        assert_eq!(machine.accept_state, "1");
        assert_eq!(machine.input, "0");
        assert_eq!(
            machine.rules,
            vec![Quintuple {
                state: "0".into(),
                read: '0',
                next_state: "1".into(),
                write: '1',
                direction: Direction::Right,
            }]
        );
    }

    #[test]
    fn test_parse_named_states_and_spacing() {
        let input = r#"
3 1 2 3

  scan   back  done
1
1   B
(scan,1)=(scan,1,R)

(scan,B)=(back,B,L)
( back , 1 ) = ( done , 1 , R )
111
"#;

        let machine = parse(input).unwrap();
        assert_eq!(machine.start_state, "scan");
        assert_eq!(machine.accept_state, "done");
        assert_eq!(machine.rules.len(), 3);
        assert_eq!(machine.rules[2].state, "back");
        assert_eq!(machine.rules[2].direction, Direction::Right);
        assert_eq!(machine.input, "111");
    }

    #[test]
    fn test_parse_without_input_line() {
        let input = "2 2 3 1\n0 1\n0 1\n0 1 B\n(0,0)=(1,1,R)";

        let machine = parse(input).unwrap();
        assert_eq!(machine.input, "");
    }

    #[test]
    fn test_parse_count_mismatch() {
        let input = "2 2 3 2\n0 1\n0 1\n0 1 B\n(0,0)=(1,1,R)\n0\n";

        let error = parse(input).unwrap_err();
        assert!(matches!(error, RtmError::ParseError(_)));
        assert!(error
            .to_string()
            .contains("Header declares 2 transitions but 1 were found"));
    }

    #[test]
    fn test_parse_state_count_mismatch() {
        let input = "3 2 3 1\n0 1\n0 1\n0 1 B\n(0,0)=(1,1,R)\n0\n";

        let error = parse(input).unwrap_err();
        assert!(error
            .to_string()
            .contains("Header declares 3 states but 2 were found"));
    }

    #[test]
    fn test_parse_unsupported_direction() {
        let input = "2 2 3 1\n0 1\n0 1\n0 1 B\n(0,0)=(1,1,S)\n0\n";

        let error = parse(input).unwrap_err();
        assert!(matches!(error, RtmError::ParseError(_)));
    }

    #[test]
    fn test_parse_missing_alphabet() {
        let input = "2 2 3 0\n0 1\n0 1\n";

        assert!(matches!(parse(input), Err(RtmError::ParseError(_))));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse("This is not a machine"),
            Err(RtmError::ParseError(_))
        ));
        assert!(parse("").is_err());
    }

    #[test]
    fn test_parse_runs_analysis() {
        // The input uses a symbol outside the input alphabet.
        let input = "2 1 3 1\n0 1\n0\n0 1 B\n(0,0)=(1,1,R)\n01\n";

        let error = parse(input).unwrap_err();
        assert!(matches!(error, RtmError::ValidationError(_)));
    }

    #[test]
    fn test_parse_input_with_inner_space() {
        let input = "2 2 3 1\n0 1\n0 1\n0 1 B\n(0,0)=(1,1,R)\n0 1\n";

        let error = parse(input).unwrap_err();
        assert!(matches!(error, RtmError::ParseError(_)));

        let padded = "2 2 3 1\n0 1\n0 1\n0 1 B\n(0,0)=(1,1,R)\n  01  \n";
        assert_eq!(parse(padded).unwrap().input, "01");
    }

    #[test]
    fn test_parse_rejects_oversized_input() {
        let input = "x".repeat(MAX_PROGRAM_SIZE + 1);
        assert!(matches!(
            parse(&input),
            Err(RtmError::ValidationError(_))
        ));
    }
}
