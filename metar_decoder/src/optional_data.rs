use nom::{
    Parser, branch::alt, bytes::complete::take_while_m_n, combinator::value, error::Error,
};

/// A METAR field that may be reported as missing, written as `N` slashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionalData<T, const N: usize> {
    Data(T),
    Undefined,
}

impl<T, const N: usize> OptionalData<T, N> {
    pub fn optional_field<'a, P>(
        parser: P,
    ) -> impl Parser<&'a str, Output = Self, Error = Error<&'a str>>
    where
        P: Parser<&'a str, Output = T, Error = Error<&'a str>>,
        T: Clone,
    {
        alt((
            parser.map(Self::Data),
            value(Self::Undefined, take_while_m_n(N, N, |c| c == '/')),
        ))
    }

    pub fn to_option(self) -> Option<T> {
        match self {
            Self::Data(data) => Some(data),
            Self::Undefined => None,
        }
    }
}
