/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use crate::ast::*;
use crate::errors::AssemblyError;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

// Derive the parser from our grammar file.
#[derive(Parser)]
#[grammar = "./grammar.pest"]
pub struct SourceParser;

// Main parsing function that takes the entire source text. Blank and
// comment-only lines yield no record; everything else becomes one
// tokenized line with its 1-based source line number.
pub fn parse_source(source: &str) -> Result<Vec<SourceLine>, AssemblyError> {
    let pairs = SourceParser::parse(Rule::program, source)?;
    let mut lines = Vec::new();

    for line_pair in pairs.flatten().filter(|p| p.as_rule() == Rule::line) {
        let mut source_line = SourceLine::default();

        for part in line_pair.into_inner() {
            match part.as_rule() {
                Rule::line_content => {
                    source_line.line_number = part.as_span().start_pos().line_col().0;
                    build_content(part, &mut source_line)?;
                }
                Rule::comment => {
                    source_line.comment = Some(part.as_str().to_string());
                }
                _ => {}
            }
        }

        // Only keep lines that carry a label or a statement.
        if source_line.label.is_some() || source_line.statement.is_some() {
            lines.push(source_line);
        }
    }

    Ok(lines)
}

fn build_content(pair: Pair<Rule>, line: &mut SourceLine) -> Result<(), AssemblyError> {
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::label => {
                let name = part
                    .into_inner()
                    .next()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                line.label = Some(name);
            }
            Rule::statement => {
                line.statement = Some(build_statement(part, line.line_number)?);
            }
            _ => {}
        }
    }
    Ok(())
}

fn build_statement(pair: Pair<Rule>, line_number: usize) -> Result<Statement, AssemblyError> {
    let mut head = None;
    let mut operands = Vec::new();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::head => {
                let upper = part.as_str().to_ascii_uppercase();
                head = Some(match upper.as_str() {
                    "LOC" => Head::Directive(Directive::Loc),
                    "DATA" => Head::Directive(Directive::Data),
                    _ => Head::Mnemonic(upper),
                });
            }
            Rule::operand_list => {
                for op in part.into_inner() {
                    operands.push(build_operand(op, line_number)?);
                }
            }
            _ => {}
        }
    }

    // The grammar guarantees a head token inside every statement.
    let head = head.ok_or_else(|| AssemblyError::MalformedDirective {
        line: line_number,
        reason: "statement without a head token".to_string(),
    })?;

    Ok(Statement { head, operands })
}

fn build_operand(pair: Pair<Rule>, line_number: usize) -> Result<Operand, AssemblyError> {
    let text = pair.as_str();
    let first = text.chars().next().unwrap_or('0');
    if first.is_ascii_digit() || first == '-' {
        let value = text
            .parse::<i64>()
            .map_err(|_| AssemblyError::OperandOutOfRange {
                line: line_number,
                field: "integer literal",
                min: i64::MIN,
                max: i64::MAX,
                actual: 0,
            })?;
        Ok(Operand::Number(value))
    } else {
        Ok(Operand::Symbol(text.to_string()))
    }
}

// ------------- unit tests -------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_instruction() {
        let lines = parse_source("LDR 0,0,10\n").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_number, 1);
        assert_eq!(lines[0].label, None);
        let statement = lines[0].statement.as_ref().unwrap();
        assert_eq!(statement.head, Head::Mnemonic("LDR".to_string()));
        assert_eq!(
            statement.operands,
            vec![
                Operand::Number(0),
                Operand::Number(0),
                Operand::Number(10)
            ]
        );
    }

    #[test]
    fn test_parse_label_and_directive() {
        let lines = parse_source("START: LOC 6\n").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].label, Some("START".to_string()));
        let statement = lines[0].statement.as_ref().unwrap();
        assert_eq!(statement.head, Head::Directive(Directive::Loc));
        assert_eq!(statement.operands, vec![Operand::Number(6)]);
    }

    #[test]
    fn test_parse_label_only_line() {
        let lines = parse_source("END:\n   HLT\n").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].label, Some("END".to_string()));
        assert_eq!(lines[0].statement, None);
        assert_eq!(lines[1].line_number, 2);
        assert_eq!(
            lines[1].statement.as_ref().unwrap().head,
            Head::Mnemonic("HLT".to_string())
        );
    }

    #[test]
    fn test_parse_mnemonic_case_insensitive() {
        let lines = parse_source("ldr 1,0,8\n").unwrap();
        assert_eq!(
            lines[0].statement.as_ref().unwrap().head,
            Head::Mnemonic("LDR".to_string())
        );
    }

    #[test]
    fn test_parse_comment_is_captured() {
        let lines = parse_source("HLT ; stop here\n").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].comment, Some("; stop here".to_string()));
    }

    #[test]
    fn test_parse_blank_and_comment_lines_skipped() {
        let lines = parse_source("\n; header comment\n\nHLT\n").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_number, 4);
    }

    #[test]
    fn test_parse_symbol_operand() {
        let lines = parse_source("JMA 0,0,END\n").unwrap();
        let statement = lines[0].statement.as_ref().unwrap();
        assert_eq!(statement.operands[2], Operand::Symbol("END".to_string()));
    }

    #[test]
    fn test_parse_indirect_marker_token() {
        let lines = parse_source("LDR 2,1,30,I\n").unwrap();
        let statement = lines[0].statement.as_ref().unwrap();
        assert_eq!(statement.operands.len(), 4);
        assert_eq!(statement.operands[3], Operand::Symbol("I".to_string()));
    }

    #[test]
    fn test_parse_negative_data_value() {
        let lines = parse_source("DATA -1\n").unwrap();
        let statement = lines[0].statement.as_ref().unwrap();
        assert_eq!(statement.head, Head::Directive(Directive::Data));
        assert_eq!(statement.operands, vec![Operand::Number(-1)]);
    }

    #[test]
    fn test_parse_operand_whitespace_trimmed() {
        let lines = parse_source("ADD 1 , 2\n").unwrap();
        let statement = lines[0].statement.as_ref().unwrap();
        assert_eq!(
            statement.operands,
            vec![Operand::Number(1), Operand::Number(2)]
        );
    }

    #[test]
    fn test_parse_garbage_is_syntax_error() {
        assert!(parse_source("LDR 0,0,10 garbage\n").is_err());
    }
}
