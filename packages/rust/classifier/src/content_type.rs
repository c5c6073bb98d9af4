//! Lexical content-type detection from URL text.

use linkenrich_shared::ContentType;

/// Markers checked in order; the first group with a hit wins.
const RULES: &[(ContentType, &[&str])] = &[
    (ContentType::Video, &["youtube.com", "youtu.be", "vimeo.com"]),
    (ContentType::News, &["news"]),
    (
        ContentType::Blog,
        &["blog", "medium.com", "tistory", "substack.com"],
    ),
];

/// Detect the content type of `url` by case-insensitive substring match.
///
/// Never touches the network and never fails; unmatched URLs are
/// [`ContentType::Article`].
pub fn url_type(url: &str) -> ContentType {
    let lower = url.to_lowercase();
    RULES
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| lower.contains(m)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ContentType::Article)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_video_hosts() {
        assert_eq!(url_type("https://www.youtube.com/watch?v=x"), ContentType::Video);
        assert_eq!(url_type("https://youtu.be/abc123"), ContentType::Video);
        assert_eq!(url_type("https://vimeo.com/12345"), ContentType::Video);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(url_type("HTTPS://WWW.YOUTUBE.COM/WATCH?V=X"), ContentType::Video);
        assert_eq!(url_type("https://Example.com/NEWS/today"), ContentType::News);
        assert_eq!(url_type("https://My.BLOG.dev/post"), ContentType::Blog);
    }

    #[test]
    fn video_wins_over_news_and_blog() {
        assert_eq!(
            url_type("https://youtube.com/@news-blog/videos"),
            ContentType::Video
        );
        assert_eq!(
            url_type("https://blog.example.com/news/youtu.be-links"),
            ContentType::Video
        );
    }

    #[test]
    fn news_wins_over_blog() {
        assert_eq!(url_type("https://news.example.com/blog/1"), ContentType::News);
        assert_eq!(url_type("https://n.news.naver.com/article/1"), ContentType::News);
    }

    #[test]
    fn blog_platforms() {
        assert_eq!(url_type("https://medium.com/@a/post-1"), ContentType::Blog);
        assert_eq!(url_type("https://someone.tistory.com/12"), ContentType::Blog);
        assert_eq!(url_type("https://author.substack.com/p/x"), ContentType::Blog);
    }

    #[test]
    fn defaults_to_article() {
        assert_eq!(url_type("https://doc.rust-lang.org/book/"), ContentType::Article);
        assert_eq!(url_type(""), ContentType::Article);
    }
}
