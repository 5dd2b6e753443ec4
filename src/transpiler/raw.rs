//! Raw query templates.
//!
//! The only text inspected in a caller's template is the `{where}` token
//! (case-insensitive) and the leading keyword of each word, for read/write
//! classification.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_till1},
    character::complete::multispace1,
    combinator::{map, value},
    multi::many0,
    sequence::terminated,
};

#[derive(Debug, Clone, PartialEq)]
enum Piece<'a> {
    Text(&'a str),
    Where,
}

fn pieces(input: &str) -> IResult<&str, Vec<Piece<'_>>> {
    many0(alt((
        value(Piece::Where, tag_no_case("{where}")),
        map(take_till1(|c: char| c == '{'), Piece::Text),
        map(tag("{"), Piece::Text),
    )))(input)
}

/// Put a compiled ` WHERE ...` clause (or nothing) into the template.
///
/// Every `{where}` token is replaced; without a token the clause is appended.
pub fn substitute_where(template: &str, clause: &str) -> String {
    let parts = match pieces(template) {
        Ok((_, parts)) => parts,
        Err(_) => vec![Piece::Text(template)],
    };
    let has_token = parts.iter().any(|p| *p == Piece::Where);
    let clause = clause.trim_start();

    if !has_token {
        return if clause.is_empty() {
            template.to_string()
        } else {
            format!("{} {}", template.trim_end(), clause)
        };
    }

    let mut sql = String::with_capacity(template.len() + clause.len());
    // Set when an empty token was dropped, so its surrounding gap collapses.
    let mut dropped = false;
    for part in parts {
        match part {
            Piece::Text(t) if dropped && t.starts_with(char::is_whitespace) => {
                let rest = t.trim_start();
                if !sql.is_empty() && !rest.is_empty() {
                    sql.push(' ');
                }
                sql.push_str(rest);
                dropped = false;
            }
            Piece::Text(t) => {
                sql.push_str(t);
                dropped = false;
            }
            Piece::Where if clause.is_empty() => {
                sql.truncate(sql.trim_end().len());
                dropped = true;
            }
            Piece::Where => sql.push_str(clause),
        }
    }
    sql.trim_end().to_string()
}

fn write_keyword(input: &str) -> IResult<&str, &str> {
    terminated(
        alt((
            tag_no_case("INSERT"),
            tag_no_case("UPDATE"),
            tag_no_case("DELETE"),
            tag_no_case("DROP"),
        )),
        multispace1,
    )(input)
}

/// Whether the statement writes: any word INSERT, UPDATE, DELETE or DROP
/// followed by whitespace.
pub fn is_write_statement(sql: &str) -> bool {
    let mut prev_is_word = false;
    for (i, c) in sql.char_indices() {
        if !prev_is_word && write_keyword(&sql[i..]).is_ok() {
            return true;
        }
        prev_is_word = c.is_alphanumeric() || c == '_';
    }
    false
}
