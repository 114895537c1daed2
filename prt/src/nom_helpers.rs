use nom::{bytes::complete::take, combinator::map, IResult as _IResult, Parser};

use crate::error::{PrtError, Section};

pub type IResult<'a, T> = _IResult<&'a [u8], T>;

/// Like [`IResult`] but failures already carry the section they belong to.
pub type PResult<'a, T> = Result<(&'a [u8], T), PrtError>;

pub fn tag4(i: &[u8]) -> IResult<'_, [u8; 4]> {
    map(take(4usize), |res: &[u8]| [res[0], res[1], res[2], res[3]]).parse(i)
}

/// Runs a fixed-size parser. Complete parsers only fail when the input runs out.
pub fn run<'a, O, P>(i: &'a [u8], section: Section, mut parser: P) -> PResult<'a, O>
where
    P: Parser<&'a [u8], Output = O, Error = nom::error::Error<&'a [u8]>>,
{
    parser.parse(i).map_err(|_| PrtError::Truncated {
        section,
        remaining: i.len(),
    })
}
