use crate::modules::books::models::Book;

fn sample(
    id: &str,
    title: &str,
    author: &str,
    synopsis: &str,
    cover: &str,
    publication_date: &str,
) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        synopsis: synopsis.to_string(),
        cover_image: format!("/attached_assets/generated_images/{cover}"),
        publication_date: publication_date.to_string(),
    }
}

/// The launch catalog shown on a fresh in-memory store. Covers live with the
/// bundled assets, not in the uploads directory.
pub fn sample_books() -> Vec<Book> {
    vec![
        sample(
            "1",
            "The Art of Storytelling",
            "Margaret Atwood",
            "A masterful exploration of narrative craft, where one of our greatest living writers shares insights into the architecture of compelling stories. From character development to plot construction, this work illuminates the creative process behind literary excellence.",
            "Classic_fiction_book_cover_abefd1ac.png",
            "March 2024",
        ),
        sample(
            "2",
            "Whispers in the Garden",
            "Ocean Vuong",
            "A luminous collection of poems that weave together themes of memory, identity, and belonging. Through vivid imagery and profound emotional resonance, these verses explore the intersections of personal history and universal human experience.",
            "Poetry_collection_cover_4e162110.png",
            "January 2024",
        ),
        sample(
            "3",
            "Chronicles of Resistance",
            "Isabel Wilkerson",
            "An illuminating historical account that traces forgotten stories of courage and resilience across generations. Through meticulous research and powerful storytelling, this work brings to light the voices that shaped our collective past.",
            "History_book_cover_86aac4b3.png",
            "September 2023",
        ),
        sample(
            "4",
            "The Midnight Library",
            "Matt Haig",
            "A thought-provoking tale about choices, regrets, and the infinite possibilities of life. Between life and death exists a library where each book represents a different version of the life you could have lived.",
            "Modern_fiction_cover_7561a2e9.png",
            "June 2023",
        ),
        sample(
            "5",
            "On Being and Time",
            "Simone de Beauvoir",
            "A profound philosophical meditation on existence, consciousness, and the human condition. This work challenges readers to reconsider fundamental questions about meaning, freedom, and our place in the world.",
            "Philosophy_book_cover_e28b73b0.png",
            "November 2023",
        ),
        sample(
            "6",
            "Stories from the Edge",
            "Jhumpa Lahiri",
            "A captivating anthology of short fiction that explores the complexity of human relationships and cultural identity. Each story offers a window into lives marked by transition, longing, and the search for connection.",
            "Story_collection_cover_01f65ab1.png",
            "February 2024",
        ),
    ]
}
