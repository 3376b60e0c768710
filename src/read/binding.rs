use nom::bytes::complete::take_while1;
use nom::character::complete::char;
use nom::combinator::{all_consuming, map};
use nom::sequence::separated_pair;
use nom::IResult;

use crate::{Error, Result};

/// A track binding path split into the node it drives and the animated
/// property, e.g. `mixamorigHips.quaternion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding<'a> {
    pub node: &'a str,
    pub property: &'a str,
}

impl Binding<'_> {
    pub fn is_position(&self) -> bool {
        self.property == "position"
    }

    pub fn is_quaternion(&self) -> bool {
        self.property == "quaternion"
    }
}

fn node(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != '.')(i)
}

fn property(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(i)
}

fn binding(i: &str) -> IResult<&str, Binding<'_>> {
    map(separated_pair(node, char('.'), property), |(node, property)| {
        Binding { node, property }
    })(i)
}

pub fn parse_binding(path: &str) -> Result<Binding<'_>> {
    all_consuming(binding)(path)
        .map(|(_, b)| b)
        .map_err(|_| Error::InvalidBinding(path.to_string()))
}
