//! Game modes and their value sequences

use serde::{Deserialize, Serialize};

/// Which content a level plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    Alphabet,
    Numbers,
    /// Lower-case letters
    Clcase,
    Shapes,
    Colors,
}

impl GameMode {
    pub const ALL: [GameMode; 5] = [
        GameMode::Alphabet,
        GameMode::Numbers,
        GameMode::Clcase,
        GameMode::Shapes,
        GameMode::Colors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Alphabet => "alphabet",
            GameMode::Numbers => "numbers",
            GameMode::Clcase => "clcase",
            GameMode::Shapes => "shapes",
            GameMode::Colors => "colors",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "alphabet" | "abc" => Some(GameMode::Alphabet),
            "numbers" | "123" => Some(GameMode::Numbers),
            "clcase" => Some(GameMode::Clcase),
            "shapes" => Some(GameMode::Shapes),
            "colors" => Some(GameMode::Colors),
            _ => None,
        }
    }

    /// Ordered targets for the group modes; colors mode has none
    pub fn sequence(&self) -> Vec<String> {
        match self {
            GameMode::Alphabet => ('A'..='Z').map(String::from).collect(),
            GameMode::Numbers => (1..=10).map(|n| n.to_string()).collect(),
            GameMode::Clcase => ('a'..='z').map(String::from).collect(),
            GameMode::Shapes => ["Circle", "Square", "Triangle", "Rectangle", "Pentagon"]
                .into_iter()
                .map(String::from)
                .collect(),
            GameMode::Colors => Vec::new(),
        }
    }

    /// What is actually drawn for a value
    pub fn display_value<'a>(&self, value: &'a str) -> &'a str {
        match (self, value) {
            (GameMode::Clcase, "a") => "α",
            _ => value,
        }
    }

    /// Word handed to the speech collaborator
    pub fn spoken_word(&self, value: &str) -> String {
        match self {
            GameMode::Numbers => number_word(value)
                .map(String::from)
                .unwrap_or_else(|| value.to_string()),
            _ => value.to_lowercase(),
        }
    }

    /// Fall speed multiplier applied at spawn
    pub fn fall_speed_scale(&self) -> f32 {
        match self {
            GameMode::Numbers => 1.2,
            _ => 1.0,
        }
    }
}

fn number_word(value: &str) -> Option<&'static str> {
    Some(match value {
        "1" => "one",
        "2" => "two",
        "3" => "three",
        "4" => "four",
        "5" => "five",
        "6" => "six",
        "7" => "seven",
        "8" => "eight",
        "9" => "nine",
        "10" => "ten",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences() {
        assert_eq!(GameMode::Alphabet.sequence().len(), 26);
        assert_eq!(GameMode::Numbers.sequence().last().map(String::as_str), Some("10"));
        assert_eq!(GameMode::Shapes.sequence()[0], "Circle");
        assert!(GameMode::Colors.sequence().is_empty());
    }

    #[test]
    fn test_display_and_speech() {
        assert_eq!(GameMode::Clcase.display_value("a"), "α");
        assert_eq!(GameMode::Clcase.display_value("b"), "b");
        assert_eq!(GameMode::Alphabet.display_value("a"), "a");
        assert_eq!(GameMode::Numbers.spoken_word("7"), "seven");
        assert_eq!(GameMode::Shapes.spoken_word("Circle"), "circle");
    }

    #[test]
    fn test_round_trip_names() {
        for mode in GameMode::ALL {
            assert_eq!(GameMode::from_str(mode.as_str()), Some(mode));
        }
    }
}
