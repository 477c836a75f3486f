//! Static FAQ content tree — categories, subcategories, questions.
//!
//! Loaded once at startup and never mutated afterwards. All indexed
//! lookups return `NotFound` instead of panicking so navigation can fall
//! back to the nearest valid parent view.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{LoadError, NotFound};

/// A single FAQ entry. `id` is unique across the whole tree.
#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub id: u32,
    pub question: String,
    pub answer: String,
}

/// A named group of questions inside a category.
#[derive(Debug, Clone, Deserialize)]
pub struct Subcategory {
    pub name: String,
    pub questions: Vec<Question>,
}

/// A top-level FAQ section.
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub name: String,
    pub subcategories: Vec<Subcategory>,
}

/// The immutable category → subcategory → question hierarchy.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentTree {
    pub categories: Vec<Category>,
}

/// A position inside the tree, derived per-turn from button tokens.
/// Never persisted beyond a single response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPosition {
    Root,
    Category(usize),
    Subcategory(usize, usize),
}

impl ContentTree {
    /// Load and validate a tree from a JSON reader.
    pub fn load(reader: impl Read) -> Result<Self, LoadError> {
        let tree: ContentTree = serde_json::from_reader(reader)?;
        tree.validate()?;
        Ok(tree)
    }

    /// Load and validate a tree from a JSON file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path)?;
        Self::load(std::io::BufReader::new(file))
    }

    /// Structural invariants: non-empty at every level, globally unique
    /// question ids.
    fn validate(&self) -> Result<(), LoadError> {
        if self.categories.is_empty() {
            return Err(LoadError::NoCategories);
        }
        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.subcategories.is_empty() {
                return Err(LoadError::EmptyCategory {
                    category: category.name.clone(),
                });
            }
            for subcategory in &category.subcategories {
                if subcategory.questions.is_empty() {
                    return Err(LoadError::EmptySubcategory {
                        category: category.name.clone(),
                        subcategory: subcategory.name.clone(),
                    });
                }
                for question in &subcategory.questions {
                    if !seen.insert(question.id) {
                        return Err(LoadError::DuplicateQuestionId {
                            id: question.id,
                            category: category.name.clone(),
                            subcategory: subcategory.name.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn category(&self, i: usize) -> Result<&Category, NotFound> {
        self.categories.get(i).ok_or(NotFound::Category(i))
    }

    pub fn subcategory(&self, i: usize, j: usize) -> Result<&Subcategory, NotFound> {
        self.category(i)?
            .subcategories
            .get(j)
            .ok_or(NotFound::Subcategory(i, j))
    }

    /// Global lookup by question id, in tree traversal order.
    pub fn question_by_id(&self, id: u32) -> Result<&Question, NotFound> {
        self.iter_questions()
            .find(|q| q.id == id)
            .ok_or(NotFound::Question(id))
    }

    /// All questions in traversal order: category, then subcategory, then
    /// question.
    pub fn iter_questions(&self) -> impl Iterator<Item = &Question> {
        self.categories
            .iter()
            .flat_map(|c| c.subcategories.iter())
            .flat_map(|s| s.questions.iter())
    }
}
