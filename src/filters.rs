//! Filter state for profile listings and its URL query-string codec.
//!
//! A missing or empty parameter means "no constraint". Id lists never contain
//! duplicates, and malformed tokens are dropped rather than coerced.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{CrewRole, Rating, SortOrder};

/// An entity-valued filter dimension.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Dimension {
    Genre,
    Company,
    Crew(CrewRole),
}

impl Dimension {
    pub const ALL: [Dimension; 9] = [
        Dimension::Genre,
        Dimension::Company,
        Dimension::Crew(CrewRole::Actor),
        Dimension::Crew(CrewRole::Director),
        Dimension::Crew(CrewRole::Producer),
        Dimension::Crew(CrewRole::ExecutiveProducer),
        Dimension::Crew(CrewRole::Writer),
        Dimension::Crew(CrewRole::Composer),
        Dimension::Crew(CrewRole::Cinematographer),
    ];

    pub fn param(self) -> &'static str {
        match self {
            Dimension::Genre => "genres",
            Dimension::Company => "companies",
            Dimension::Crew(CrewRole::Actor) => "actors",
            Dimension::Crew(CrewRole::Director) => "directors",
            Dimension::Crew(CrewRole::Producer) => "producers",
            Dimension::Crew(CrewRole::ExecutiveProducer) => "execProducers",
            Dimension::Crew(CrewRole::Writer) => "writers",
            Dimension::Crew(CrewRole::Composer) => "composers",
            Dimension::Crew(CrewRole::Cinematographer) => "cinematographers",
        }
    }

    pub fn from_param(param: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.param() == param)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FilterState {
    // Empty lists are never stored, so equality ignores cleared dimensions.
    selections: BTreeMap<Dimension, Vec<i32>>,
    pub decade: Option<i16>,
    pub year: Option<i16>,
    pub rating: Option<Rating>,
    pub public_utility: bool,
    pub sort: SortOrder,
}

/// One user action on the filter UI.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterAction {
    Toggle(Dimension, i32),
    Clear(Dimension),
    SetDecade(Option<i16>),
    SetYear(Option<i16>),
    SetRating(Option<Rating>),
    SetPublicUtility(bool),
    SetSort(SortOrder),
    Reset,
}

/// Four-digit years, the only ones the `year`/`decade` params accept.
pub const YEAR_RANGE: std::ops::RangeInclusive<i16> = 1000..=9999;

impl FilterState {
    pub fn ids(&self, dimension: Dimension) -> &[i32] {
        self.selections.get(&dimension).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Adds `id` to the dimension unless already present.
    pub fn select(&mut self, dimension: Dimension, id: i32) {
        let ids = self.selections.entry(dimension).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    pub fn apply(&mut self, action: FilterAction) {
        match action {
            FilterAction::Toggle(dimension, id) => {
                let ids = self.selections.entry(dimension).or_default();
                if let Some(pos) = ids.iter().position(|&x| x == id) {
                    ids.remove(pos);
                } else {
                    ids.push(id);
                }
                if ids.is_empty() {
                    self.selections.remove(&dimension);
                }
            },
            FilterAction::Clear(dimension) => {
                self.selections.remove(&dimension);
            },
            FilterAction::SetDecade(decade) => {
                self.decade = decade.filter(|d| YEAR_RANGE.contains(d)).map(decade_base);
                if self.decade.is_some() {
                    self.year = None;
                }
            },
            FilterAction::SetYear(year) => {
                self.year = year.filter(|y| YEAR_RANGE.contains(y));
                if self.year.is_some() {
                    self.decade = None;
                }
            },
            FilterAction::SetRating(rating) => self.rating = rating,
            FilterAction::SetPublicUtility(on) => self.public_utility = on,
            FilterAction::SetSort(sort) => self.sort = sort,
            FilterAction::Reset => *self = Self::default(),
        }
    }

    /// Builds the state from decoded query pairs, ignoring unrelated keys.
    ///
    /// Both `decade` and `year` are kept when present; the predicate builder
    /// decides precedence.
    pub fn decode(pairs: &[(String, String)]) -> Self {
        let mut state = Self::default();

        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            if let Some(dimension) = Dimension::from_param(key) {
                for token in value.split(',') {
                    let token = token.trim();
                    if token.is_empty() {
                        continue;
                    }
                    match token.parse::<i32>() {
                        Ok(id) => state.select(dimension, id),
                        Err(_) => {
                            debug!(param = %key, token = %token, "dropping non-numeric filter id")
                        },
                    }
                }
                continue;
            }

            match key.as_str() {
                "decade" => {
                    state.decade =
                        parse_year(value).filter(|d| YEAR_RANGE.contains(d)).map(decade_base)
                },
                "year" => state.year = parse_year(value).filter(|y| YEAR_RANGE.contains(y)),
                "rating" => state.rating = Rating::parse(value),
                "isPublicUtility" => state.public_utility = value == "true",
                "sort" => state.sort = SortOrder::from_param(value),
                _ => {},
            }
        }

        state
    }

    pub fn from_query_string(query: &str) -> Self {
        Self::decode(&parse_pairs(query))
    }

    /// Query pairs in a fixed parameter order; empty dimensions are omitted.
    pub fn encode(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();

        for dimension in Dimension::ALL {
            let ids = self.ids(dimension);
            if ids.is_empty() {
                continue;
            }
            let joined = ids.iter().map(i32::to_string).collect::<Vec<_>>().join(",");
            out.push((dimension.param(), joined));
        }

        if let Some(decade) = self.decade {
            out.push(("decade", decade.to_string()));
        }
        if let Some(year) = self.year {
            out.push(("year", year.to_string()));
        }
        if let Some(rating) = self.rating {
            out.push(("rating", rating.to_string()));
        }
        if self.public_utility {
            out.push(("isPublicUtility", "true".to_string()));
        }
        if let Some(sort) = self.sort.param() {
            out.push(("sort", sort.to_string()));
        }

        out
    }

    pub fn to_query_string(&self) -> String {
        self.encode()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(&v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

pub fn decade_base(year: i16) -> i16 {
    year.div_euclid(10) * 10
}

fn parse_year(s: &str) -> Option<i16> {
    if s.len() != 4 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Splits and percent-decodes an `application/x-www-form-urlencoded` query.
pub fn parse_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map(|s| s.into_owned()).unwrap_or_else(|_| spaced.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(query: &str) -> Vec<(String, String)> {
        parse_pairs(query)
    }

    #[test]
    fn empty_query_is_unconstrained() {
        let state = FilterState::from_query_string("");
        assert!(state.is_empty());

        let state = FilterState::from_query_string("genres=&decade=&sort=");
        assert!(state.is_empty());
    }

    #[test]
    fn decodes_id_lists_without_duplicates() {
        let state = FilterState::from_query_string("genres=27,35,27&actors=5");
        assert_eq!(state.ids(Dimension::Genre), &[27, 35]);
        assert_eq!(state.ids(Dimension::Crew(CrewRole::Actor)), &[5]);
        assert!(state.ids(Dimension::Company).is_empty());
    }

    #[test]
    fn drops_non_numeric_ids() {
        let state = FilterState::from_query_string("genres=abc,27,NaN,&directors=x");
        assert_eq!(state.ids(Dimension::Genre), &[27]);
        assert!(state.ids(Dimension::Crew(CrewRole::Director)).is_empty());
        assert_eq!(state, FilterState::from_query_string("genres=27"));
    }

    #[test]
    fn decodes_percent_encoded_commas() {
        let state = FilterState::from_query_string("execProducers=1%2C2");
        assert_eq!(state.ids(Dimension::Crew(CrewRole::ExecutiveProducer)), &[1, 2]);
    }

    #[test]
    fn decade_is_normalized_to_base_year() {
        let state = FilterState::from_query_string("decade=1995");
        assert_eq!(state.decade, Some(1990));

        let state = FilterState::from_query_string("decade=95&year=abcd");
        assert_eq!(state.decade, None);
        assert_eq!(state.year, None);
    }

    #[test]
    fn decode_keeps_both_decade_and_year() {
        let state = FilterState::from_query_string("decade=1990&year=2004");
        assert_eq!(state.decade, Some(1990));
        assert_eq!(state.year, Some(2004));
    }

    #[test]
    fn scalar_params() {
        let state =
            FilterState::from_query_string("rating=3.5&isPublicUtility=true&sort=runtime-asc");
        assert_eq!(state.rating, Rating::from_halves(7));
        assert!(state.public_utility);
        assert_eq!(state.sort, SortOrder::RuntimeAsc);

        let state = FilterState::from_query_string("rating=3.3&isPublicUtility=yes&sort=title");
        assert_eq!(state.rating, None);
        assert!(!state.public_utility);
        assert_eq!(state.sort, SortOrder::Default);
    }

    #[test]
    fn ignores_unrelated_params() {
        let state = FilterState::from_query_string("username=alice&page=3&includeFacets=false");
        assert!(state.is_empty());
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut state = FilterState::default();
        state.apply(FilterAction::Toggle(Dimension::Genre, 27));
        state.apply(FilterAction::Toggle(Dimension::Genre, 35));
        assert_eq!(state.ids(Dimension::Genre), &[27, 35]);

        state.apply(FilterAction::Toggle(Dimension::Genre, 27));
        assert_eq!(state.ids(Dimension::Genre), &[35]);

        state.apply(FilterAction::Toggle(Dimension::Genre, 35));
        assert_eq!(state, FilterState::default());
    }

    #[test]
    fn decade_and_year_clear_each_other() {
        let mut state = FilterState::default();
        state.apply(FilterAction::SetYear(Some(1994)));
        state.apply(FilterAction::SetDecade(Some(1980)));
        assert_eq!(state.decade, Some(1980));
        assert_eq!(state.year, None);

        state.apply(FilterAction::SetYear(Some(2001)));
        assert_eq!(state.year, Some(2001));
        assert_eq!(state.decade, None);

        state.apply(FilterAction::SetDecade(None));
        assert_eq!(state.year, Some(2001));
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = FilterState::from_query_string("genres=1&year=2000&sort=runtime-desc");
        state.apply(FilterAction::Reset);
        assert!(state.is_empty());
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let mut state = FilterState::default();
        for action in [
            FilterAction::Toggle(Dimension::Genre, 27),
            FilterAction::Toggle(Dimension::Genre, 35),
            FilterAction::Toggle(Dimension::Company, 420),
            FilterAction::Toggle(Dimension::Crew(CrewRole::Actor), 31),
            FilterAction::Toggle(Dimension::Crew(CrewRole::ExecutiveProducer), 7),
            FilterAction::Toggle(Dimension::Crew(CrewRole::Cinematographer), 9),
            FilterAction::SetDecade(Some(1990)),
            FilterAction::SetRating(Rating::from_halves(9)),
            FilterAction::SetPublicUtility(true),
            FilterAction::SetSort(SortOrder::RuntimeDesc),
        ] {
            state.apply(action);
        }

        let query = state.to_query_string();
        assert_eq!(FilterState::from_query_string(&query), state);

        state.apply(FilterAction::SetYear(Some(1997)));
        state.apply(FilterAction::SetRating(Rating::from_halves(8)));
        let query = state.to_query_string();
        assert_eq!(FilterState::from_query_string(&query), state);
    }

    #[test]
    fn encode_uses_fixed_param_order() {
        let state = FilterState::from_query_string("sort=runtime-asc&year=2001&actors=3&genres=1");
        let keys: Vec<_> = state.encode().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["genres", "actors", "year", "sort"]);
    }

    #[test]
    fn parse_pairs_decodes_plus_and_missing_values() {
        assert_eq!(
            pairs("username=jane+doe&flag&x=%41"),
            vec![
                ("username".to_string(), "jane doe".to_string()),
                ("flag".to_string(), String::new()),
                ("x".to_string(), "A".to_string()),
            ]
        );
    }
}
