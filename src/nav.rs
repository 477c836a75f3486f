//! Menu rendering over the content tree.
//!
//! Pure decisions: given a tree position, produce the reply text and the
//! selectable options. Rendering/escaping for a concrete markup dialect is
//! the transport's job.

use std::sync::Arc;

use crate::content::ContentTree;
use crate::error::NotFound;
use crate::event::{ButtonAction, Program};
use crate::search::MAX_RESULTS;

/// A reply to hand to the transport: text plus ordered (label, token)
/// options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub options: Vec<MenuOption>,
}

impl Reply {
    /// A reply with no buttons.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: Vec::new(),
        }
    }
}

/// One selectable button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub label: String,
    pub token: String,
}

impl MenuOption {
    fn new(label: impl Into<String>, action: ButtonAction) -> Self {
        Self {
            label: label.into(),
            token: action.encode(),
        }
    }
}

/// Stateless menu builder over an immutable tree.
pub struct Navigator {
    tree: Arc<ContentTree>,
    /// Name of the category whose menu carries the "apply" option.
    intake_category: String,
}

impl Navigator {
    pub fn new(tree: Arc<ContentTree>, intake_category: impl Into<String>) -> Self {
        Self {
            tree,
            intake_category: intake_category.into(),
        }
    }

    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    /// Top-level menu: one option per category plus search.
    pub fn root_menu(&self) -> Reply {
        let mut options: Vec<MenuOption> = self
            .tree
            .categories
            .iter()
            .enumerate()
            .map(|(i, c)| MenuOption::new(&c.name, ButtonAction::Category(i)))
            .collect();
        options.push(MenuOption::new("🔍 Поиск по вопросам", ButtonAction::Search));
        Reply {
            text: "Выберите категорию:".to_string(),
            options,
        }
    }

    /// Subcategory list for a category. The intake-trigger category also
    /// carries the "apply" option.
    pub fn category_menu(&self, i: usize) -> Result<Reply, NotFound> {
        let category = self.tree.category(i)?;
        let mut options: Vec<MenuOption> = category
            .subcategories
            .iter()
            .enumerate()
            .map(|(j, s)| MenuOption::new(&s.name, ButtonAction::Subcategory(i, j)))
            .collect();
        if category.name == self.intake_category {
            options.push(MenuOption::new("📝 Подать заявку", ButtonAction::Apply));
        }
        options.push(MenuOption::new("⬅️ Назад", ButtonAction::BackToCategories));
        Ok(Reply {
            text: format!("{}\nВыберите раздел:", category.name),
            options,
        })
    }

    /// Numbered question listing for a subcategory. Both the listing and
    /// the buttons are truncated to the first 5 questions in stored order;
    /// questions past the 5th are unreachable from this menu. Known
    /// limitation, kept on purpose.
    pub fn subcategory_menu(&self, i: usize, j: usize) -> Result<Reply, NotFound> {
        let subcategory = self.tree.subcategory(i, j)?;
        let listed = &subcategory.questions[..subcategory.questions.len().min(MAX_RESULTS)];

        let mut text = format!("{}\n", subcategory.name);
        let mut options = Vec::with_capacity(listed.len() + 1);
        for (n, q) in listed.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", n + 1, q.question));
            options.push(MenuOption::new(
                format!("{}", n + 1),
                ButtonAction::Question(q.id),
            ));
        }
        options.push(MenuOption::new(
            "⬅️ Назад",
            ButtonAction::BackToSubcategories(i),
        ));
        Ok(Reply { text, options })
    }

    /// Question with its answer, plus the root menu to continue browsing.
    pub fn question_view(&self, id: u32) -> Result<Reply, NotFound> {
        let question = self.tree.question_by_id(id)?;
        let root = self.root_menu();
        Ok(Reply {
            text: format!("❓ {}\n\n{}", question.question, question.answer),
            options: root.options,
        })
    }

    /// Search results as a numbered listing with one button per hit, or a
    /// friendly empty notice. Zero hits is a valid outcome, not an error.
    pub fn search_results(&self, hits: &[&crate::content::Question]) -> Reply {
        if hits.is_empty() {
            let mut reply = self.root_menu();
            reply.text = format!("По вашему запросу ничего не найдено.\n\n{}", reply.text);
            return reply;
        }
        let mut text = String::from("Вот что удалось найти:\n");
        let mut options = Vec::with_capacity(hits.len() + 1);
        for (n, q) in hits.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", n + 1, q.question));
            options.push(MenuOption::new(
                format!("{}", n + 1),
                ButtonAction::Question(q.id),
            ));
        }
        options.push(MenuOption::new("⬅️ В меню", ButtonAction::BackToCategories));
        Reply { text, options }
    }

    /// The two-way program choice offered at the final application step.
    pub fn program_menu(&self) -> Reply {
        Reply {
            text: "Выберите программу обучения:".to_string(),
            options: vec![
                MenuOption::new(Program::Vo.label(), ButtonAction::Program(Program::Vo)),
                MenuOption::new(Program::Spo.label(), ButtonAction::Program(Program::Spo)),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::tests::sample_tree;
    use crate::normalize::Normalizer;
    use crate::search::search;

    fn navigator() -> Navigator {
        Navigator::new(Arc::new(sample_tree()), "Поступление")
    }

    #[test]
    fn root_menu_lists_categories_plus_search() {
        let reply = navigator().root_menu();
        assert_eq!(reply.options.len(), 3); // 2 categories + search
        assert_eq!(reply.options[0].token, "cat_0");
        assert_eq!(reply.options[1].token, "cat_1");
        assert_eq!(reply.options[2].token, "search");
    }

    #[test]
    fn category_menu_has_apply_only_for_intake_category() {
        let nav = navigator();
        let intake = nav.category_menu(0).unwrap();
        assert!(intake.options.iter().any(|o| o.token == "apply"));

        let other = nav.category_menu(1).unwrap();
        assert!(!other.options.iter().any(|o| o.token == "apply"));
        assert_eq!(other.options.last().unwrap().token, "back_to_categories");
    }

    #[test]
    fn category_menu_out_of_range_is_not_found() {
        assert!(navigator().category_menu(5).is_err());
    }

    #[test]
    fn subcategory_menu_caps_questions_at_five() {
        let nav = navigator();
        // Subcategory (0,1) has 6 questions; only 5 listed + back.
        let reply = nav.subcategory_menu(0, 1).unwrap();
        assert_eq!(reply.options.len(), 6);
        assert_eq!(reply.options[0].token, "q_3");
        assert_eq!(reply.options[4].token, "q_7");
        assert!(!reply.options.iter().any(|o| o.token == "q_8"));
        assert_eq!(reply.options.last().unwrap().token, "back_to_subcat_0");
        // Listing text is numbered 1..=5.
        assert!(reply.text.contains("1. "));
        assert!(reply.text.contains("5. "));
        assert!(!reply.text.contains("6. "));
    }

    #[test]
    fn subcategory_menu_lists_min_of_five_and_count() {
        let nav = navigator();
        let reply = nav.subcategory_menu(1, 0).unwrap();
        assert_eq!(reply.options.len(), 2); // 1 question + back
    }

    #[test]
    fn question_view_includes_answer_and_root_options() {
        let nav = navigator();
        let reply = nav.question_view(7).unwrap();
        assert!(reply.text.contains("Можно ли пересдать экзамен?"));
        assert!(reply.text.contains("Пересдача возможна один раз."));
        assert_eq!(reply.options.len(), nav.root_menu().options.len());
    }

    #[test]
    fn question_view_unknown_id_is_not_found() {
        assert!(navigator().question_view(404).is_err());
    }

    #[test]
    fn search_results_render_hits_with_buttons() {
        let nav = navigator();
        let tree = sample_tree();
        let n = Normalizer::russian();
        let hits = search(&tree, &n, "экзамен");
        let reply = nav.search_results(&hits);
        assert_eq!(reply.options.len(), hits.len() + 1);
        assert!(reply.options[0].token.starts_with("q_"));
    }

    #[test]
    fn search_results_empty_is_friendly() {
        let nav = navigator();
        let reply = nav.search_results(&[]);
        assert!(reply.text.contains("ничего не найдено"));
        assert!(!reply.options.is_empty()); // root menu follows
    }

    #[test]
    fn program_menu_is_a_closed_two_way_choice() {
        let reply = navigator().program_menu();
        assert_eq!(reply.options.len(), 2);
        assert_eq!(reply.options[0].token, "prog_vo");
        assert_eq!(reply.options[1].token, "prog_spo");
    }
}
