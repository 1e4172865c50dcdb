// Parsing of positional needs ("2:1,3:2") and excluded player ids ("1,2,3").
//
// Two flavours: strict parsing for the command line, where a typo should stop
// the run, and lenient parsing for HTTP query strings, where bad tokens are
// dropped and the rest of the request still goes through.

use thiserror::Error;

use crate::squad::position::Position;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("need entry '{0}' is not of the form POSITION:COUNT")]
    MalformedNeed(String),

    #[error("unknown position '{0}' (expected 1-4 or GK/DEF/MID/FWD)")]
    UnknownPosition(String),

    #[error("invalid count '{count}' for position {position}")]
    InvalidCount { position: Position, count: String },

    #[error("invalid player id '{0}'")]
    InvalidId(String),
}

/// Resolve a position key: an element-type id (1-4) or a label.
fn position_key(key: &str) -> Option<Position> {
    let key = key.trim();
    match key.parse::<u32>() {
        Ok(id) => Position::from_element_type(id),
        Err(_) => Position::from_str_pos(key),
    }
}

fn tokens<'a>(input: &'a str, separators: &'a [char]) -> impl Iterator<Item = &'a str> + 'a {
    input
        .split(|c| separators.contains(&c))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ---------------------------------------------------------------------------
// Strict
// ---------------------------------------------------------------------------

/// Parse `"2:1,3:2,4:1"` (or `"DEF:1,MID:2"`). Every entry needs an explicit
/// count; zero counts are kept and left for the allocator to skip. An empty
/// string means no needs.
pub fn parse_needs(input: &str) -> Result<Vec<(Position, usize)>, ParseError> {
    tokens(input, &[','])
        .map(|token| {
            let (key, count) = token
                .split_once(':')
                .ok_or_else(|| ParseError::MalformedNeed(token.to_string()))?;
            let position =
                position_key(key).ok_or_else(|| ParseError::UnknownPosition(key.trim().to_string()))?;
            let count = count
                .trim()
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidCount {
                    position,
                    count: count.trim().to_string(),
                })?;
            Ok((position, count))
        })
        .collect()
}

/// Parse comma-separated player ids.
pub fn parse_exclude_ids(input: &str) -> Result<Vec<u32>, ParseError> {
    tokens(input, &[','])
        .map(|t| t.parse::<u32>().map_err(|_| ParseError::InvalidId(t.to_string())))
        .collect()
}

// ---------------------------------------------------------------------------
// Lenient
// ---------------------------------------------------------------------------

/// Forgiving needs parser for query strings.
///
/// `;` works as a separator too, a bare position counts as one, counts are
/// read as decimals and truncated ("2.9" is 2), and entries with unknown
/// positions, unreadable or non-positive counts are dropped. Repeated
/// positions are summed into their first occurrence.
pub fn parse_needs_lenient(input: &str) -> Vec<(Position, usize)> {
    let mut needs: Vec<(Position, usize)> = Vec::new();

    for token in tokens(input, &[',', ';']) {
        let parsed = match token.split_once(':') {
            None => position_key(token).map(|pos| (pos, 1)),
            Some((key, count)) => position_key(key).and_then(|pos| {
                let count = count.trim().parse::<f64>().ok()?.trunc();
                (count.is_finite() && count >= 1.0).then_some((pos, count as usize))
            }),
        };
        let Some((position, count)) = parsed else {
            continue;
        };
        match needs.iter_mut().find(|(pos, _)| *pos == position) {
            Some((_, existing)) => *existing += count,
            None => needs.push((position, count)),
        }
    }

    needs
}

/// Forgiving id parser: `,` or `;` separated, unreadable ids dropped.
pub fn parse_exclude_ids_lenient(input: &str) -> Vec<u32> {
    tokens(input, &[',', ';'])
        .filter_map(|t| t.parse::<u32>().ok())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use Position::*;

    #[test]
    fn strict_needs_by_element_type() {
        assert_eq!(
            parse_needs("2:1,3:2,4:1").unwrap(),
            vec![(Defender, 1), (Midfielder, 2), (Forward, 1)]
        );
    }

    #[test]
    fn strict_needs_accept_labels_and_spaces() {
        assert_eq!(
            parse_needs(" gk:1 , MID : 2 ").unwrap(),
            vec![(Goalkeeper, 1), (Midfielder, 2)]
        );
    }

    #[test]
    fn strict_needs_keep_zero_counts() {
        assert_eq!(parse_needs("1:0,2:1").unwrap(), vec![(Goalkeeper, 0), (Defender, 1)]);
        assert!(parse_needs("").unwrap().is_empty());
    }

    #[test]
    fn strict_needs_reject_bad_tokens() {
        assert_eq!(parse_needs("2").unwrap_err(), ParseError::MalformedNeed("2".into()));
        assert_eq!(parse_needs("5:1").unwrap_err(), ParseError::UnknownPosition("5".into()));
        assert_eq!(
            parse_needs("3:-1").unwrap_err(),
            ParseError::InvalidCount {
                position: Midfielder,
                count: "-1".into()
            }
        );
        assert!(parse_needs("3:1.5").is_err());
    }

    #[test]
    fn strict_exclude() {
        assert_eq!(parse_exclude_ids("1, 2,,3").unwrap(), vec![1, 2, 3]);
        assert!(parse_exclude_ids("").unwrap().is_empty());
        assert_eq!(parse_exclude_ids("4,x").unwrap_err(), ParseError::InvalidId("x".into()));
    }

    #[test]
    fn lenient_needs_forgive_and_merge() {
        assert_eq!(
            parse_needs_lenient("3:2.9;2,junk,4:0,3:1,9:2,FWD:abc,1:-2"),
            vec![(Midfielder, 3), (Defender, 1)]
        );
    }

    #[test]
    fn lenient_needs_bare_tokens_accumulate() {
        assert_eq!(parse_needs_lenient("2,2,DEF"), vec![(Defender, 3)]);
        assert!(parse_needs_lenient("  ").is_empty());
    }

    #[test]
    fn lenient_exclude_drops_garbage() {
        assert_eq!(parse_exclude_ids_lenient("1;2, x ,-3,4"), vec![1, 2, 4]);
    }
}
