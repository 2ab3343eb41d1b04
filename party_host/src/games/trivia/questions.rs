//! Bundled trivia question bank.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A multiple-choice question with exactly four options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaQuestion {
    pub id: String,
    pub question: String,
    pub options: [String; 4],
    pub correct_index: usize,
    pub category: String,
    pub difficulty: Difficulty,
}

impl TriviaQuestion {
    pub fn new(
        id: &str,
        question: &str,
        options: [&str; 4],
        correct_index: usize,
        category: &str,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id: id.to_string(),
            question: question.to_string(),
            options: options.map(str::to_string),
            correct_index,
            category: category.to_string(),
            difficulty,
        }
    }
}

type Seed = (&'static str, &'static str, [&'static str; 4], usize, &'static str, Difficulty);

#[rustfmt::skip]
const BANK: &[Seed] = &[
    ("geo-1", "Which river flows through Cairo?", ["Congo", "Niger", "Nile", "Zambezi"], 2, "Geography", Difficulty::Easy),
    ("geo-2", "What is the capital of Canada?", ["Toronto", "Ottawa", "Vancouver", "Montreal"], 1, "Geography", Difficulty::Easy),
    ("geo-3", "Which country has the most natural lakes?", ["Canada", "Russia", "Finland", "Sweden"], 0, "Geography", Difficulty::Medium),
    ("geo-4", "Mount Kilimanjaro is located in which country?", ["Kenya", "Uganda", "Ethiopia", "Tanzania"], 3, "Geography", Difficulty::Medium),
    ("sci-1", "What gas do plants absorb from the air for photosynthesis?", ["Oxygen", "Carbon dioxide", "Nitrogen", "Helium"], 1, "Science", Difficulty::Easy),
    ("sci-2", "What is the chemical symbol for gold?", ["Gd", "Go", "Au", "Ag"], 2, "Science", Difficulty::Easy),
    ("sci-3", "How many bones are in the adult human body?", ["206", "186", "226", "256"], 0, "Science", Difficulty::Medium),
    ("sci-4", "Which planet has the shortest day?", ["Earth", "Mars", "Saturn", "Jupiter"], 3, "Science", Difficulty::Hard),
    ("his-1", "In which year did the Berlin Wall fall?", ["1987", "1989", "1991", "1993"], 1, "History", Difficulty::Easy),
    ("his-2", "Who was the first emperor of Rome?", ["Julius Caesar", "Nero", "Augustus", "Trajan"], 2, "History", Difficulty::Medium),
    ("his-3", "The Magna Carta was sealed in which century?", ["13th", "11th", "15th", "17th"], 0, "History", Difficulty::Hard),
    ("art-1", "Who painted 'The Starry Night'?", ["Claude Monet", "Vincent van Gogh", "Pablo Picasso", "Salvador Dali"], 1, "Art", Difficulty::Easy),
    ("art-2", "Which artist is known for the sculpture 'The Thinker'?", ["Donatello", "Bernini", "Michelangelo", "Auguste Rodin"], 3, "Art", Difficulty::Medium),
    ("lit-1", "Who wrote 'Pride and Prejudice'?", ["Jane Austen", "Emily Bronte", "Mary Shelley", "George Eliot"], 0, "Literature", Difficulty::Easy),
    ("lit-2", "In which novel does the character Captain Ahab appear?", ["Treasure Island", "Moby-Dick", "The Odyssey", "Robinson Crusoe"], 1, "Literature", Difficulty::Medium),
    ("mus-1", "How many keys does a standard piano have?", ["76", "80", "88", "92"], 2, "Music", Difficulty::Medium),
    ("mus-2", "Which composer wrote 'The Four Seasons'?", ["Bach", "Mozart", "Handel", "Vivaldi"], 3, "Music", Difficulty::Easy),
    ("spo-1", "How many players are on the field for one soccer team?", ["11", "9", "10", "12"], 0, "Sports", Difficulty::Easy),
    ("spo-2", "In which sport would you perform a 'slam dunk'?", ["Volleyball", "Basketball", "Tennis", "Handball"], 1, "Sports", Difficulty::Easy),
    ("tec-1", "What does 'CPU' stand for?", ["Central Process Unit", "Computer Personal Unit", "Central Processing Unit", "Core Processing Utility"], 2, "Technology", Difficulty::Easy),
];

/// The full bundled bank, in a fixed order.
pub fn question_bank() -> Vec<TriviaQuestion> {
    BANK.iter()
        .map(|(id, question, options, correct, category, difficulty)| {
            TriviaQuestion::new(id, question, *options, *correct, category, *difficulty)
        })
        .collect()
}

/// Up to `count` distinct questions from `pool`, shuffled.
pub fn pick_random(pool: &[TriviaQuestion], count: usize) -> Vec<TriviaQuestion> {
    let mut picked = pool.to_vec();
    picked.shuffle(&mut rand::rng());
    picked.truncate(count.min(pool.len()));
    picked
}
