//! Built-in domain catalog
//!
//! Six ready-to-use slot-filling domains. Each is an ordinary
//! [`DomainSpec`] value; nothing here is special-cased by the runtime, so
//! external specs mix freely with these.

use indexmap::IndexMap;

use crate::spec::{DomainSpec, NlgBundle, SlotSpec};

/// Names of every built-in domain, in catalog order.
pub const NAMES: [&str; 6] = [
    "restaurant",
    "restaurant_style",
    "rest_pitt",
    "bus",
    "weather",
    "movie",
];

/// Look up a built-in domain by name.
pub fn by_name(name: &str) -> Option<DomainSpec> {
    match name {
        "restaurant" => Some(restaurant()),
        "restaurant_style" => Some(restaurant_style()),
        "rest_pitt" => Some(rest_pitt()),
        "bus" => Some(bus()),
        "weather" => Some(weather()),
        "movie" => Some(movie()),
        _ => None,
    }
}

/// Every built-in domain, in catalog order.
pub fn all() -> Vec<DomainSpec> {
    NAMES.iter().filter_map(|name| by_name(name)).collect()
}

const CITIES: [&str; 10] = [
    "Pittsburgh",
    "New York",
    "Boston",
    "Seattle",
    "Los Angeles",
    "San Francisco",
    "San Jose",
    "Philadelphia",
    "Washington DC",
    "Austin",
];

const PITT_PLACES: [&str; 12] = [
    "Downtown",
    "CMU",
    "Forbes and Murray",
    "Craig",
    "Waterfront",
    "Airport",
    "U Pitt",
    "Mellon Park",
    "Lawrance",
    "Monroveil",
    "Shadyside",
    "Squrill Hill",
];

pub fn restaurant() -> DomainSpec {
    let mut nlg = IndexMap::new();
    nlg.insert(
        "loc".to_string(),
        NlgBundle::new(
            &["I am at {}.", "{}.", "I'm interested in food at {}.", "At {}.", "In {}."],
            &["Which city are you interested in?", "Which place?"],
        ),
    );
    nlg.insert(
        "food_pref".to_string(),
        NlgBundle::new(
            &["I like {} food.", "{} food.", "{} restaurant.", "{}."],
            &["What kind of food do you like?", "What type of restaurant?"],
        ),
    );
    nlg.insert(
        "open".to_string(),
        NlgBundle::new(
            &["The restaurant is {}.", "It is {} right now."],
            &["Tell me if the restaurant is open.", "What's the hours?"],
        )
        .with_yn("open", &["Is the restaurant open?"])
        .with_yn("closed", &["Is it closed?"]),
    );
    nlg.insert(
        "parking".to_string(),
        NlgBundle::new(
            &["The restaurant has {}.", "This place has {}."],
            &["What kind of parking does it have?", "How easy is it to park?"],
        )
        .with_yn("street parking", &["Does it have street parking?"])
        .with_yn("valet parking", &["Does it have valet parking?"]),
    );
    nlg.insert(
        "price".to_string(),
        NlgBundle::new(
            &["The restaurant serves {} food.", "The price is {}."],
            &["What's the average price?", "How expensive it is?"],
        )
        .with_yn("expensive", &["Is it expensive?"])
        .with_yn("moderate", &["Does it have moderate price?"])
        .with_yn("cheap", &["Is it cheap?"]),
    );
    nlg.insert(
        "default".to_string(),
        NlgBundle::new(
            &["Restaurant {} is a good choice."],
            &[
                "I need a restaurant.",
                "I am looking for a restaurant.",
                "Recommend me a place to eat.",
            ],
        ),
    );

    DomainSpec {
        name: "restaurant".into(),
        greet: "Welcome to restaurant recommendation system.".into(),
        usr_slots: vec![
            SlotSpec::new("loc", "location city", &CITIES),
            SlotSpec::new(
                "food_pref",
                "food preference",
                &[
                    "Thai", "Chinese", "Korean", "Japanese", "American", "Italian", "Indian",
                    "French", "Greek", "Mexican", "Russian", "Hawaiian",
                ],
            ),
        ],
        sys_slots: vec![
            SlotSpec::new("open", "if it's open now", &["open", "closed"]),
            SlotSpec::new("price", "average price per person", &["cheap", "moderate", "expensive"]),
            SlotSpec::new(
                "parking",
                "if it has parking",
                &["street parking", "valet parking", "no parking"],
            ),
        ],
        nlg,
        db_size: 100,
    }
}

/// Same schema as `restaurant`, different surface voice.
pub fn restaurant_style() -> DomainSpec {
    let mut spec = restaurant();
    spec.name = "restaurant_style".into();
    spec.greet = "Hello there. I know a lot about places to eat.".into();
    spec.nlg.insert(
        "loc".to_string(),
        NlgBundle::new(
            &["I am at {}.", "{}.", "I'm interested in food at {}.", "At {}.", "In {}."],
            &["Which area are you currently locating at?", "well, what is the place?"],
        ),
    );
    spec.nlg.insert(
        "food_pref".to_string(),
        NlgBundle::new(
            &["I like {} food.", "{} food.", "{} restaurant.", "{}."],
            &["What cusine type are you interested", "What do you like to eat?"],
        ),
    );
    spec.nlg.insert(
        "open".to_string(),
        NlgBundle::new(
            &["This wonderful place is {}.", "Currently, this place is {}."],
            &["Tell me if the restaurant is open.", "What's the hours?"],
        )
        .with_yn("open", &["Is the restaurant open?"])
        .with_yn("closed", &["Is it closed?"]),
    );
    spec.nlg.insert(
        "parking".to_string(),
        NlgBundle::new(
            &["The parking status is {}.", "For parking, it does have {}."],
            &["What kind of parking does it have?", "How easy is it to park?"],
        )
        .with_yn("street parking", &["Does it have street parking?"])
        .with_yn("valet parking", &["Does it have valet parking?"]),
    );
    spec.nlg.insert(
        "price".to_string(),
        NlgBundle::new(
            &[
                "This eating place provides {} food.",
                "Let me check that for you. The price is {}.",
            ],
            &["What's the average price?", "How expensive it is?"],
        )
        .with_yn("expensive", &["Is it expensive?"])
        .with_yn("moderate", &["Does it have moderate price?"])
        .with_yn("cheap", &["Is it cheap?"]),
    );
    spec.nlg.insert(
        "default".to_string(),
        NlgBundle::new(
            &["Let me look up in my database. A good choice is {}."],
            &[
                "I need a restaurant.",
                "I am looking for a restaurant.",
                "Recommend me a place to eat.",
            ],
        ),
    );
    spec
}

/// Pittsburgh restaurant expert: neighborhoods and cooking styles.
pub fn rest_pitt() -> DomainSpec {
    let mut nlg = IndexMap::new();
    nlg.insert(
        "loc".to_string(),
        NlgBundle::new(
            &["I am at {}.", "{}.", "I'm interested in food at {}.", "At {}.", "In {}."],
            &["Which city are you interested in?", "Which place?"],
        ),
    );
    nlg.insert(
        "food_pref".to_string(),
        NlgBundle::new(
            &["I like {} food.", "{} food.", "{} restaurant.", "{}."],
            &["What kind of food do you like?", "What type of restaurant?"],
        ),
    );
    nlg.insert(
        "open".to_string(),
        NlgBundle::new(
            &["The restaurant is {}.", "It is {} right now."],
            &["Tell me if the restaurant is open.", "What's the hours?"],
        )
        .with_yn("open", &["Is the restaurant open?"])
        .with_yn("closed", &["Is it closed?"]),
    );
    nlg.insert(
        "parking".to_string(),
        NlgBundle::new(
            &["The restaurant has {}.", "This place has {}."],
            &["What kind of parking does it have?", "How easy is it to park?"],
        )
        .with_yn("street parking", &["Does it have street parking?"])
        .with_yn("garage parking", &["Does it have garage parking?"]),
    );
    nlg.insert(
        "price".to_string(),
        NlgBundle::new(
            &["The restaurant serves {} food.", "The price is {}."],
            &["What's the average price?", "How expensive it is?"],
        )
        .with_yn("fancy", &["Is it expensive?"])
        .with_yn("average", &["Does it have moderate price?"])
        .with_yn("cheap", &["Is it cheap?"]),
    );
    nlg.insert(
        "default".to_string(),
        NlgBundle::new(
            &["Restaurant {} is a good choice."],
            &[
                "I need a restaurant.",
                "I am looking for a restaurant.",
                "Recommend me a place to eat.",
            ],
        ),
    );

    DomainSpec {
        name: "rest_pitt".into(),
        greet: "I am an expert about Pittsburgh restaurant.".into(),
        usr_slots: vec![
            SlotSpec::new("loc", "location city", &PITT_PLACES),
            SlotSpec::new(
                "food_pref",
                "food preference",
                &[
                    "healthy", "fried", "panned", "steamed", "hot pot", "grilled", "salad",
                    "boiled", "raw", "stewed",
                ],
            ),
        ],
        sys_slots: vec![
            SlotSpec::new(
                "open",
                "if it's open now",
                &["open", "going to start", "going to close", "closed"],
            ),
            SlotSpec::new("price", "average price per person", &["cheap", "average", "fancy"]),
            SlotSpec::new(
                "parking",
                "if it has parking",
                &["garage parking", "street parking", "no parking"],
            ),
        ],
        nlg,
        db_size: 150,
    }
}

pub fn bus() -> DomainSpec {
    let arrive_vocab: Vec<String> = (0..30).step_by(5).map(|t| t.to_string()).collect();
    let duration_vocab: Vec<String> = (0..60).step_by(5).map(|t| t.to_string()).collect();

    let mut arrive_bundle = NlgBundle::new(
        &[
            "The bus will arrive in {} minutes.",
            "Arrive in {} minutes.",
            "Will be here in {} minutes",
        ],
        &[
            "When will the bus arrive?",
            "How long do I need to wait?",
            "What's the estimated arrival time",
        ],
    );
    for minutes in (0..30).step_by(5) {
        let question = if minutes > 15 {
            "Is it a long wait?"
        } else {
            "Will it be here shortly?"
        };
        arrive_bundle = arrive_bundle.with_yn(&minutes.to_string(), &[question]);
    }

    let mut duration_bundle = NlgBundle::new(
        &["It will take {} minutes.", "The ride is {} minutes long."],
        &["How long will it take?", "How much tim will it take?"],
    );
    for minutes in (0..60).step_by(5) {
        let question = if minutes > 30 {
            "Will it take long to get there?"
        } else {
            "Is it a short trip?"
        };
        duration_bundle = duration_bundle.with_yn(&minutes.to_string(), &[question]);
    }

    let mut nlg = IndexMap::new();
    nlg.insert(
        "from_loc".to_string(),
        NlgBundle::new(
            &["I am at {}.", "{}.", "Leaving from {}.", "At {}.", "Departure place is {}."],
            &["Where are you leaving from?", "What's the departure place?"],
        ),
    );
    nlg.insert(
        "to_loc".to_string(),
        NlgBundle::new(
            &["Going to {}.", "{}.", "Destination is {}.", "Go to {}.", "To {}"],
            &["Where are you going?", "Where do you want to take off?"],
        ),
    );
    nlg.insert(
        "datetime".to_string(),
        NlgBundle::new(
            &["At {}.", "{}.", "I am leaving on {}.", "Departure time is {}."],
            &["When are you going?", "What time do you need the bus?"],
        ),
    );
    nlg.insert("arrive_in".to_string(), arrive_bundle);
    nlg.insert("duration".to_string(), duration_bundle);
    nlg.insert(
        "default".to_string(),
        NlgBundle::new(
            &["Bus {} can take you there."],
            &["Look for bus information.", "I need a bus.", "Recommend me a bus to take."],
        ),
    );

    let mut datetime_vocab: Vec<String> = ["today", "tomorrow", "tonight", "this morning", "this afternoon"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    datetime_vocab.extend((1..=24).map(|t| t.to_string()));

    DomainSpec {
        name: "bus".into(),
        greet: "Ask me about bus information.".into(),
        usr_slots: vec![
            SlotSpec::new("from_loc", "departure place", &PITT_PLACES),
            SlotSpec::new("to_loc", "arrival place", &PITT_PLACES),
            SlotSpec {
                name: "datetime".into(),
                description: "leaving time".into(),
                vocabulary: datetime_vocab,
            },
        ],
        sys_slots: vec![
            SlotSpec {
                name: "arrive_in".into(),
                description: "how soon it arrives".into(),
                vocabulary: arrive_vocab,
            },
            SlotSpec {
                name: "duration".into(),
                description: "how long it takes".into(),
                vocabulary: duration_vocab,
            },
        ],
        nlg,
        db_size: 150,
    }
}

pub fn weather() -> DomainSpec {
    let weather_types = ["raining", "snowing", "windy", "sunny", "foggy", "cloudy"];

    let mut weather_bundle = NlgBundle::new(
        &["The weather will be {}.", "The weather type will be {}."],
        &["What's the weather type?", "What will be the weather like"],
    );
    for kind in weather_types {
        let question = format!("Is it going to be {kind}?");
        weather_bundle = weather_bundle.with_yn(kind, &[question.as_str()]);
    }

    let mut nlg = IndexMap::new();
    nlg.insert(
        "loc".to_string(),
        NlgBundle::new(
            &["I am at {}.", "{}.", "Weather at {}.", "At {}.", "In {}."],
            &["Which city are you interested in?", "Which place?"],
        ),
    );
    nlg.insert(
        "datetime".to_string(),
        NlgBundle::new(
            &["Weather {}", "{}.", "I am interested in {}."],
            &["What time's weather?", "What date are you interested?"],
        ),
    );
    nlg.insert(
        "temperature".to_string(),
        NlgBundle::new(
            &["The temperature will be {}.", "The temperature that time will be {}."],
            &["What's the temperature?", "What will be the temperature?"],
        ),
    );
    nlg.insert("weather_type".to_string(), weather_bundle);
    nlg.insert(
        "default".to_string(),
        NlgBundle::new(
            &["Your weather report {} is here."],
            &["What's the weather?", "What will the weather be?"],
        ),
    );

    DomainSpec {
        name: "weather".into(),
        greet: "Weather bot is here.".into(),
        usr_slots: vec![
            SlotSpec::new("loc", "location city", &CITIES),
            SlotSpec::new(
                "datetime",
                "which time's weather?",
                &[
                    "today",
                    "tomorrow",
                    "tonight",
                    "this morning",
                    "the day after tomorrow",
                    "this weekend",
                ],
            ),
        ],
        sys_slots: vec![
            SlotSpec {
                name: "temperature".into(),
                description: "the temperature".into(),
                vocabulary: (20..40).step_by(2).map(|t| t.to_string()).collect(),
            },
            SlotSpec {
                name: "weather_type".into(),
                description: "the type".into(),
                vocabulary: weather_types.iter().map(|s| s.to_string()).collect(),
            },
        ],
        nlg,
        db_size: 40,
    }
}

pub fn movie() -> DomainSpec {
    let companies = ["20th Century Fox", "Sony", "MGM", "Walt Disney", "Universal"];
    let directors: Vec<String> = ('A'..='Z').map(|c| c.to_string()).collect();

    let mut company_bundle = NlgBundle::new(
        &["It's made by {}.", "The movie is from {}."],
        &["Which company produced this movie?", "Which company?"],
    );
    for company in companies {
        let question = format!("Is this movie from {company}?");
        company_bundle = company_bundle.with_yn(company, &[question.as_str()]);
    }

    let mut director_bundle = NlgBundle::new(
        &["The director is {}.", "It's director by {}."],
        &["Who is the director?", "Who directed it?"],
    );
    for director in &directors {
        let question = format!("Is it directed by {director}?");
        director_bundle = director_bundle.with_yn(director, &[question.as_str()]);
    }

    let mut nlg = IndexMap::new();
    nlg.insert(
        "genre".to_string(),
        NlgBundle::new(
            &["I like {} movies.", "{}.", "I love {} ones.", "{} movies."],
            &["What genre do you like?", "Which type of movie?"],
        ),
    );
    nlg.insert(
        "years".to_string(),
        NlgBundle::new(&["Movies in {}", "In {}."], &["What's the time period?", "Movie in what years?"]),
    );
    nlg.insert(
        "country".to_string(),
        NlgBundle::new(
            &["Movie from {}", "{}.", "From {}."],
            &["Which country's movie?", "Movie from what country?"],
        ),
    );
    nlg.insert(
        "rating".to_string(),
        NlgBundle::new(
            &["This movie has a rating of {}.", "The rating is {}."],
            &["What's the rating?", "How people rate this movie?"],
        )
        .with_yn("5", &["Does it have a perfect rating?"])
        .with_yn("4", &["Does it have a rating of 4/5?"])
        .with_yn("1", &["Does it have a very bad rating?"]),
    );
    nlg.insert("company".to_string(), company_bundle);
    nlg.insert("director".to_string(), director_bundle);
    nlg.insert(
        "default".to_string(),
        NlgBundle::new(
            &["Movie {} is a good choice."],
            &[
                "Recommend a movie.",
                "Give me some good suggestions about movies.",
                "What should I watch now",
            ],
        ),
    );

    DomainSpec {
        name: "movie".into(),
        greet: "Want to know about movies?".into(),
        usr_slots: vec![
            SlotSpec::new(
                "genre",
                "type of movie",
                &[
                    "Action", "Sci-Fi", "Comedy", "Crime", "Sport", "Documentary", "Drama",
                    "Family", "Horror", "War", "Music", "Fantasy", "Romance", "Western",
                ],
            ),
            SlotSpec::new(
                "years",
                "when",
                &["60s", "70s", "80s", "90s", "2000-2010", "2010-present"],
            ),
            SlotSpec::new(
                "country",
                "where",
                &["USA", "France", "China", "Korea", "Japan", "Germany", "Mexico", "Russia", "Thailand"],
            ),
        ],
        sys_slots: vec![
            SlotSpec {
                name: "rating".into(),
                description: "user rating".into(),
                vocabulary: (0..5).map(|r| r.to_string()).collect(),
            },
            SlotSpec {
                name: "company".into(),
                description: "the production company".into(),
                vocabulary: companies.iter().map(|s| s.to_string()).collect(),
            },
            SlotSpec {
                name: "director".into(),
                description: "the director's name".into(),
                vocabulary: directors,
            },
        ],
        nlg,
        db_size: 200,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_every_builtin_builds() {
        for spec in all() {
            let name = spec.name.clone();
            let mut rng = StdRng::seed_from_u64(1);
            let domain = Domain::build(spec, &mut rng)
                .unwrap_or_else(|e| panic!("{name} failed to build: {e}"));
            assert!(!domain.usr_slots.is_empty());
            // #default plus at least two declared system slots
            assert!(domain.sys_slots.len() >= 3, "{name}");
        }
    }

    #[test]
    fn test_by_name_matches_names() {
        for name in NAMES {
            assert_eq!(by_name(name).unwrap().name, name);
        }
        assert!(by_name("karaoke").is_none());
    }

    #[test]
    fn test_vocabularies_have_at_least_two_words() {
        for spec in all() {
            for slot in spec.usr_slots.iter().chain(spec.sys_slots.iter()) {
                assert!(
                    slot.vocabulary.len() >= 2,
                    "{}: {}",
                    spec.name,
                    slot.name
                );
            }
        }
    }

    #[test]
    fn test_every_slot_has_an_nlg_bundle() {
        for spec in all() {
            for slot in spec.usr_slots.iter().chain(spec.sys_slots.iter()) {
                assert!(
                    spec.nlg.contains_key(&slot.name),
                    "{}: {} lacks nlg",
                    spec.name,
                    slot.name
                );
            }
            assert!(spec.nlg.contains_key("default"), "{}", spec.name);
        }
    }
}
