//! Catalog served when no backend is reachable.

use super::models::{Book, BookRow};

struct SeedEntry {
    id: &'static str,
    title: &'static str,
    author: &'static str,
    rating: f64,
    pages: u32,
    category: &'static str,
    accent: &'static str,
    featured: bool,
    description: &'static str,
    gutenberg: Option<u32>,
    audio: Option<&'static str>,
    progress: Option<f64>,
}

const SEED: [SeedEntry; 11] = [
    SeedEntry {
        id: "seed-pride-and-prejudice",
        title: "Pride and Prejudice",
        author: "Jane Austen",
        rating: 4.8,
        pages: 432,
        category: "Romance",
        accent: "#be185d",
        featured: true,
        description: "Elizabeth Bennet trades barbs with the proud Mr. Darcy in a comedy of manners and first impressions.",
        gutenberg: Some(1342),
        audio: Some("https://librivox.org/pride-and-prejudice-by-jane-austen/"),
        progress: Some(0.42),
    },
    SeedEntry {
        id: "seed-frankenstein",
        title: "Frankenstein",
        author: "Mary Shelley",
        rating: 4.6,
        pages: 280,
        category: "Horror",
        accent: "#4d7c0f",
        featured: true,
        description: "A young scientist animates a creature and spends the rest of his life fleeing the consequences.",
        gutenberg: Some(84),
        audio: Some("https://librivox.org/frankenstein-or-the-modern-prometheus-by-mary-wollstonecraft-shelley/"),
        progress: None,
    },
    SeedEntry {
        id: "seed-time-machine",
        title: "The Time Machine",
        author: "H. G. Wells",
        rating: 4.3,
        pages: 118,
        category: "Sci-Fi",
        accent: "#0e7490",
        featured: false,
        description: "A Victorian inventor travels to the year 802,701 and finds humanity split in two.",
        gutenberg: Some(35),
        audio: None,
        progress: Some(0.1),
    },
    SeedEntry {
        id: "seed-sherlock-holmes",
        title: "The Adventures of Sherlock Holmes",
        author: "Arthur Conan Doyle",
        rating: 4.7,
        pages: 307,
        category: "Mystery",
        accent: "#1e3a8a",
        featured: true,
        description: "Twelve cases from 221B Baker Street, from a red-headed league to a speckled band.",
        gutenberg: Some(1661),
        audio: Some("https://librivox.org/the-adventures-of-sherlock-holmes-by-sir-arthur-conan-doyle/"),
        progress: None,
    },
    SeedEntry {
        id: "seed-dracula",
        title: "Dracula",
        author: "Bram Stoker",
        rating: 4.5,
        pages: 418,
        category: "Horror",
        accent: "#7f1d1d",
        featured: false,
        description: "Letters and diaries trace a Transylvanian count's arrival in England.",
        gutenberg: Some(345),
        audio: None,
        progress: None,
    },
    SeedEntry {
        id: "seed-moby-dick",
        title: "Moby-Dick",
        author: "Herman Melville",
        rating: 4.1,
        pages: 635,
        category: "Adventure",
        accent: "#1d4ed8",
        featured: false,
        description: "Captain Ahab drives the Pequod after the white whale that took his leg.",
        gutenberg: Some(2701),
        audio: None,
        progress: None,
    },
    SeedEntry {
        id: "seed-art-of-war",
        title: "The Art of War",
        author: "Sun Tzu",
        rating: 4.4,
        pages: 96,
        category: "History",
        accent: "#92400e",
        featured: false,
        description: "Thirteen short chapters on strategy, terrain, and knowing when not to fight.",
        gutenberg: Some(132),
        audio: None,
        progress: None,
    },
    SeedEntry {
        id: "seed-meditations",
        title: "Meditations",
        author: "Marcus Aurelius",
        rating: 4.6,
        pages: 254,
        category: "Self-Help",
        accent: "#57534e",
        featured: true,
        description: "Private notes on duty and calm written by a Roman emperor on campaign.",
        gutenberg: None,
        audio: None,
        progress: None,
    },
    SeedEntry {
        id: "seed-little-women",
        title: "Little Women",
        author: "Louisa May Alcott",
        rating: 4.4,
        pages: 449,
        category: "Literary",
        accent: "#9d174d",
        featured: false,
        description: "Four March sisters grow up in Civil War era Massachusetts.",
        gutenberg: Some(514),
        audio: None,
        progress: None,
    },
    SeedEntry {
        id: "seed-count-of-monte-cristo",
        title: "The Count of Monte Cristo",
        author: "Alexandre Dumas",
        rating: 4.9,
        pages: 1276,
        category: "Adventure",
        accent: "#155e75",
        featured: false,
        description: "Wrongly imprisoned, Edmond Dantès escapes with a fortune and a long memory.",
        gutenberg: Some(1184),
        audio: None,
        progress: None,
    },
    SeedEntry {
        id: "seed-alice-in-wonderland",
        title: "Alice's Adventures in Wonderland",
        author: "Lewis Carroll",
        rating: 4.2,
        pages: 96,
        category: "Fantasy",
        accent: "#7c3aed",
        featured: false,
        description: "A girl follows a rabbit underground into a world that runs on nonsense.",
        gutenberg: Some(11),
        audio: None,
        progress: None,
    },
];

/// Fresh copy of the fallback catalog, in presentation order.
pub fn catalog() -> Vec<Book> {
    SEED.iter()
        .map(|entry| {
            Book::from(BookRow {
                id: entry.id.to_string(),
                title: entry.title.to_string(),
                author: entry.author.to_string(),
                price: 0.0,
                rating: entry.rating,
                pages: entry.pages,
                category: entry.category.to_string(),
                accent: Some(entry.accent.to_string()),
                featured: Some(entry.featured),
                description: Some(entry.description.to_string()),
                cover: None,
                audio_preview: entry.audio.map(str::to_string),
                file_url: entry
                    .gutenberg
                    .map(|id| format!("https://www.gutenberg.org/ebooks/{id}.epub3.images")),
                progress: entry.progress,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn eleven_unique_entries() {
        let books = catalog();
        assert_eq!(books.len(), 11);
        let ids: HashSet<_> = books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids.len(), books.len());
    }

    #[test]
    fn seed_is_not_sorted_by_title() {
        let titles: Vec<_> = catalog().into_iter().map(|b| b.title).collect();
        let mut sorted = titles.clone();
        sorted.sort();
        assert_ne!(titles, sorted);
        assert_eq!(titles[0], "Pride and Prejudice");
    }

    #[test]
    fn every_entry_is_displayable() {
        for book in catalog() {
            assert!(!book.title.is_empty());
            assert!((0.0..=5.0).contains(&book.rating));
            assert!(book.pages > 0);
            if let Some(progress) = book.progress {
                assert!((0.0..=1.0).contains(&progress));
            }
        }
    }
}
