//! Derived views over a catalog snapshot: search, category browsing, and the
//! curated rows shown on the home and library screens.
//!
//! Category labels are compared case-insensitively here; the repository
//! stores them untouched.

use std::collections::HashSet;

use super::models::Book;

const NEW_ARRIVALS: usize = 6;
const TRENDING: usize = 6;
const POPULAR_AUTHORS: usize = 8;
const READING_LIST: usize = 4;
const QUICK_READ_PAGES: u32 = 320;

/// Top-level browse split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pillar {
    Fiction,
    Nonfiction,
}

impl Pillar {
    pub const ALL: [Pillar; 2] = [Pillar::Fiction, Pillar::Nonfiction];

    pub fn label(self) -> &'static str {
        match self {
            Pillar::Fiction => "Fiction",
            Pillar::Nonfiction => "Nonfiction",
        }
    }

    pub fn genres(self) -> &'static [&'static str] {
        match self {
            Pillar::Fiction => &[
                "Fantasy",
                "Sci-Fi",
                "Romance",
                "Mystery",
                "Horror",
                "Literary",
                "Historical",
                "Thriller",
                "Adventure",
            ],
            Pillar::Nonfiction => &[
                "Biography",
                "History",
                "Self-Help",
                "Cookbooks",
                "Cooking",
                "Science",
                "True Crime",
                "Business",
                "Nonfiction",
            ],
        }
    }

    /// Whether a category label files under this pillar.
    pub fn contains(self, category: &str) -> bool {
        let category = category.trim();
        let listed = self
            .genres()
            .iter()
            .any(|genre| genre.eq_ignore_ascii_case(category));
        listed
            || match self {
                Pillar::Fiction => category.eq_ignore_ascii_case("fiction"),
                Pillar::Nonfiction => category.eq_ignore_ascii_case("nonfiction"),
            }
    }

    /// Pillar a category belongs to, if any.
    pub fn of(category: &str) -> Option<Pillar> {
        Pillar::ALL.into_iter().find(|pillar| pillar.contains(category))
    }
}

/// Title or author contains `query`, ignoring case. A blank query matches everything.
pub fn search<'a>(books: &'a [Book], query: &str) -> Vec<&'a Book> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return books.iter().collect();
    }
    books
        .iter()
        .filter(|book| {
            book.title.to_lowercase().contains(&query)
                || book.author.to_lowercase().contains(&query)
        })
        .collect()
}

pub fn by_category<'a>(books: &'a [Book], category: &str) -> Vec<&'a Book> {
    let category = category.trim();
    books
        .iter()
        .filter(|book| book.category.trim().eq_ignore_ascii_case(category))
        .collect()
}

/// Books in `pillar`, narrowed to `genre` unless it is `None` or `"All"`.
pub fn in_pillar<'a>(books: &'a [Book], pillar: Pillar, genre: Option<&str>) -> Vec<&'a Book> {
    let genre = genre
        .map(str::trim)
        .filter(|g| !g.is_empty() && !g.eq_ignore_ascii_case("all"));
    books
        .iter()
        .filter(|book| pillar.contains(&book.category))
        .filter(|book| genre.map_or(true, |g| book.category.trim().eq_ignore_ascii_case(g)))
        .collect()
}

/// First featured book, else the first book.
pub fn hero(books: &[Book]) -> Option<&Book> {
    books
        .iter()
        .find(|book| book.is_featured())
        .or_else(|| books.first())
}

pub fn featured_picks(books: &[Book]) -> Vec<&Book> {
    books.iter().filter(|book| book.is_featured()).collect()
}

pub fn staff_picks(books: &[Book]) -> Vec<&Book> {
    books.iter().skip(3).take(5).collect()
}

pub fn quick_reads(books: &[Book]) -> Vec<&Book> {
    books
        .iter()
        .filter(|book| book.pages <= QUICK_READ_PAGES)
        .collect()
}

pub fn audio_books(books: &[Book]) -> Vec<&Book> {
    books
        .iter()
        .filter(|book| book.audio_preview.as_deref().is_some_and(|a| !a.is_empty()))
        .collect()
}

pub fn new_arrivals(books: &[Book]) -> Vec<&Book> {
    books.iter().take(NEW_ARRIVALS).collect()
}

/// Highest rated first; ties keep catalog order.
pub fn trending(books: &[Book]) -> Vec<&Book> {
    let mut ranked: Vec<&Book> = books.iter().collect();
    ranked.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    ranked.truncate(TRENDING);
    ranked
}

/// Distinct authors in order of first appearance.
pub fn popular_authors(books: &[Book]) -> Vec<&str> {
    let mut seen = HashSet::new();
    books
        .iter()
        .map(|book| book.author.as_str())
        .filter(|author| seen.insert(*author))
        .take(POPULAR_AUTHORS)
        .collect()
}

/// The first few books with a progress value filled in for display.
pub fn reading_list(books: &[Book]) -> Vec<Book> {
    books
        .iter()
        .take(READING_LIST)
        .enumerate()
        .map(|(index, book)| {
            let mut book = book.clone();
            book.progress = Some(book.progress.unwrap_or(0.25 + index as f64 * 0.15));
            book
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::seed;

    fn titles(books: &[&Book]) -> Vec<String> {
        books.iter().map(|b| b.title.clone()).collect()
    }

    #[test]
    fn search_matches_title_or_author_ignoring_case() {
        let books = seed::catalog();
        assert_eq!(
            titles(&search(&books, "SHELLEY")),
            vec!["Frankenstein".to_string()]
        );
        assert_eq!(search(&books, "adventures").len(), 2);
        assert_eq!(search(&books, "   ").len(), books.len());
    }

    #[test]
    fn category_filter_ignores_case() {
        let books = seed::catalog();
        assert_eq!(by_category(&books, "horror").len(), 2);
        assert_eq!(by_category(&books, "HORROR").len(), 2);
        assert!(by_category(&books, "Cooking").is_empty());
    }

    #[test]
    fn pillars_split_the_seed() {
        let books = seed::catalog();
        let fiction = in_pillar(&books, Pillar::Fiction, None);
        let nonfiction = in_pillar(&books, Pillar::Nonfiction, Some("All"));
        assert_eq!(fiction.len() + nonfiction.len(), books.len());
        assert_eq!(
            titles(&in_pillar(&books, Pillar::Nonfiction, Some("self-help"))),
            vec!["Meditations".to_string()]
        );
        assert_eq!(Pillar::of("business"), Some(Pillar::Nonfiction));
        assert_eq!(Pillar::of("fiction"), Some(Pillar::Fiction));
        assert_eq!(Pillar::of("Custom"), None);
    }

    #[test]
    fn curated_rows() {
        let books = seed::catalog();
        assert_eq!(hero(&books).map(|b| b.title.as_str()), Some("Pride and Prejudice"));
        assert_eq!(featured_picks(&books).len(), 4);
        assert_eq!(
            titles(&staff_picks(&books)).first().map(String::as_str),
            Some("The Adventures of Sherlock Holmes")
        );
        assert_eq!(staff_picks(&books).len(), 5);
        assert!(quick_reads(&books).iter().all(|b| b.pages <= 320));
        assert_eq!(audio_books(&books).len(), 3);
        assert_eq!(new_arrivals(&books).len(), 6);
    }

    #[test]
    fn trending_is_rating_descending_and_stable() {
        let books = seed::catalog();
        let ranked = trending(&books);
        assert_eq!(ranked.len(), 6);
        assert_eq!(ranked[0].title, "The Count of Monte Cristo");
        assert!(ranked.windows(2).all(|w| w[0].rating >= w[1].rating));
        // Frankenstein and Meditations tie at 4.6; catalog order wins.
        let tie: Vec<_> = ranked
            .iter()
            .filter(|b| b.rating == 4.6)
            .map(|b| b.title.as_str())
            .collect();
        assert_eq!(tie, vec!["Frankenstein", "Meditations"]);
    }

    #[test]
    fn authors_are_unique_in_first_seen_order() {
        let mut books = seed::catalog();
        let mut again = books[0].clone();
        again.id = "dup".into();
        books.insert(1, again);
        let authors = popular_authors(&books);
        assert_eq!(authors[0], "Jane Austen");
        assert_eq!(authors[1], "Mary Shelley");
        assert_eq!(authors.len(), 8);
    }

    #[test]
    fn reading_list_fills_missing_progress() {
        let books = seed::catalog();
        let list = reading_list(&books);
        assert_eq!(list.len(), 4);
        assert_eq!(list[0].progress, Some(0.42));
        assert!((list[1].progress.unwrap() - 0.4).abs() < 1e-9);
        assert_eq!(list[2].progress, Some(0.1));
        assert_eq!(list[3].progress, Some(0.25 + 3.0 * 0.15));
    }

    #[test]
    fn empty_catalog() {
        assert!(hero(&[]).is_none());
        assert!(trending(&[]).is_empty());
        assert!(reading_list(&[]).is_empty());
    }
}
