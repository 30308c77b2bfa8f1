use polars::prelude::*;

use crate::filter::ColumnKind;

/// One record of the fixed catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Album {
    pub id: i32,
    pub name: &'static str,
    pub artist: &'static str,
    pub year: i32,
}

pub const ALBUMS: [Album; 11] = [
    Album {
        id: 1,
        name: "Their Satanic Majesties Request",
        artist: "The Rolling Stones",
        year: 1967,
    },
    Album {
        id: 2,
        name: "Prime Cuts",
        artist: "David Bowie",
        year: 1983,
    },
    Album {
        id: 3,
        name: "Human",
        artist: "Rag'n'Bone Man",
        year: 2017,
    },
    Album {
        id: 4,
        name: "Kill 'Em All",
        artist: "Metallica",
        year: 1983,
    },
    Album {
        id: 5,
        name: "Colour by Numbers",
        artist: "Culture Club",
        year: 1983,
    },
    Album {
        id: 6,
        name: "Born in the U.S.A.",
        artist: "Bruce Springsteen",
        year: 1984,
    },
    Album {
        id: 7,
        name: "Disraeli Gears",
        artist: "Cream",
        year: 1967,
    },
    Album {
        id: 8,
        name: "Between the Buttons",
        artist: "The Rolling Stones",
        year: 1967,
    },
    Album {
        id: 9,
        name: "Sgt. Pepper's Lonely Hearts Club Band",
        artist: "The Beatles",
        year: 1967,
    },
    Album {
        id: 10,
        name: "The Battle of Los Angeles",
        artist: "Rage Against the Machine",
        year: 1999,
    },
    Album {
        id: 11,
        name: "The Slim Shady LP",
        artist: "Eminem",
        year: 1999,
    },
];

/// A displayed grid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub kind: ColumnKind,
}

const COLUMNS: [ColumnSpec; 3] = [
    ColumnSpec {
        name: "name",
        title: "Name",
        kind: ColumnKind::Text,
    },
    ColumnSpec {
        name: "artist",
        title: "Artist",
        kind: ColumnKind::Text,
    },
    ColumnSpec {
        name: "year",
        title: "Year",
        kind: ColumnKind::Number,
    },
];

/// Displayed columns in order. `id` is a row key and is not shown.
pub fn columns() -> &'static [ColumnSpec] {
    &COLUMNS
}

pub fn column(name: &str) -> Option<&'static ColumnSpec> {
    COLUMNS.iter().find(|c| c.name == name)
}

/// The catalogue as a DataFrame with columns `id`, `name`, `artist`, `year`.
pub fn albums() -> PolarsResult<DataFrame> {
    df!(
        "id" => ALBUMS.iter().map(|a| a.id).collect::<Vec<i32>>(),
        "name" => ALBUMS.iter().map(|a| a.name).collect::<Vec<&str>>(),
        "artist" => ALBUMS.iter().map(|a| a.artist).collect::<Vec<&str>>(),
        "year" => ALBUMS.iter().map(|a| a.year).collect::<Vec<i32>>()
    )
}
