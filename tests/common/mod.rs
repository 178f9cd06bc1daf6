//! Shared model for the integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use strainer::Filterable;

#[derive(Debug, Clone, Filterable)]
#[filterable(rename_all = "PascalCase")]
pub struct Weapon {
    pub name: String,
    pub level: i32,
}

#[derive(Debug, Clone, Filterable)]
#[filterable(rename_all = "PascalCase")]
pub struct Henchman {
    pub firstname: String,
    pub lastname: Option<String>,
    pub weapons: Vec<Weapon>,
}

#[derive(Debug, Clone, Filterable)]
#[filterable(rename_all = "PascalCase")]
pub struct SuperHero {
    pub firstname: String,
    pub lastname: Option<String>,
    pub nickname: Option<String>,
    pub height: f64,
    pub age: u32,
    pub powers: Vec<String>,
    pub henchman: Option<Henchman>,
    #[filterable(rename = "Birth")]
    pub birth_date: Option<NaiveDate>,
    #[filterable(skip)]
    pub secret: String,
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

pub fn heroes() -> Vec<SuperHero> {
    vec![
        SuperHero {
            firstname: "Bruce".into(),
            lastname: Some("Wayne".into()),
            nickname: Some("Batman".into()),
            height: 190.0,
            age: 35,
            powers: vec![],
            henchman: Some(Henchman {
                firstname: "Alfred".into(),
                lastname: Some("Pennyworth".into()),
                weapons: vec![Weapon {
                    name: "stick".into(),
                    level: 1,
                }],
            }),
            birth_date: date(1939, 5, 1),
            secret: "cave".into(),
        },
        SuperHero {
            firstname: "Clark".into(),
            lastname: Some("Kent".into()),
            nickname: Some("Superman".into()),
            height: 191.0,
            age: 30,
            powers: vec!["super strength".into(), "heat vision".into()],
            henchman: None,
            birth_date: date(1938, 4, 18),
            secret: "glasses".into(),
        },
        SuperHero {
            firstname: "Barry".into(),
            lastname: Some("Allen".into()),
            nickname: Some("Flash".into()),
            height: 178.0,
            age: 30,
            powers: vec!["super speed".into()],
            henchman: Some(Henchman {
                firstname: "Cisco".into(),
                lastname: None,
                weapons: vec![],
            }),
            birth_date: None,
            secret: "lab".into(),
        },
        SuperHero {
            firstname: "Diana".into(),
            lastname: None,
            nickname: None,
            height: 183.0,
            age: 800,
            powers: vec!["super strength".into()],
            henchman: None,
            birth_date: None,
            secret: "island".into(),
        },
    ]
}
