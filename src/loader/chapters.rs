//! Chapter interval arithmetic.
//!
//! A table-of-contents row marks where a chapter starts in the content
//! table; chapter `k` therefore spans the content ids from its own start
//! to just before the next chapter's start, and the last chapter runs to
//! the highest content id in the file. Pages are matched to chapters by
//! interval containment. Both the interval construction and the matching
//! are pure, and the matcher advances a cursor in lockstep with the page
//! scan so a book loads in linear time.

use crate::model::{ContentRow, IndexRow};

/// One chapter's interval over source content ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSpan {
    /// First content id of the chapter
    pub start_id: i64,
    /// Last content id of the chapter (inclusive)
    pub end_id: i64,
    /// Cleaned heading
    pub title: String,
    /// Heading depth, 1 = top
    pub level: i64,
}

/// Builds chapter intervals from table-of-contents rows.
///
/// Rows are sorted by id; each interval ends just before the next row's
/// id, and the last interval extends to `max_content_id`. Empty headings
/// become `فصل <start_id>`.
pub fn chapter_spans(index_rows: &[IndexRow], max_content_id: i64) -> Vec<ChapterSpan> {
    let mut rows: Vec<&IndexRow> = index_rows.iter().collect();
    rows.sort_by_key(|row| row.id);

    let mut spans = Vec::with_capacity(rows.len());
    for (k, row) in rows.iter().enumerate() {
        let end_id = match rows.get(k + 1) {
            Some(next) => next.id - 1,
            None => max_content_id,
        };
        let title = if row.title.is_empty() {
            format!("فصل {}", row.id)
        } else {
            row.title.clone()
        };
        spans.push(ChapterSpan { start_id: row.id, end_id, title, level: row.level });
    }
    spans
}

/// Part number of the first content row inside each span, for volume
/// linkage. NULL parts bucket to 1; a span with no rows defaults to 1.
///
/// `content` must be in ascending id order.
pub fn span_parts(spans: &[ChapterSpan], content: &[&ContentRow]) -> Vec<i64> {
    let mut parts = vec![1i64; spans.len()];
    let mut cursor = 0usize;
    for (k, span) in spans.iter().enumerate() {
        while cursor < content.len() && content[cursor].id < span.start_id {
            cursor += 1;
        }
        if let Some(row) = content.get(cursor) {
            if row.id <= span.end_id {
                parts[k] = row.part.unwrap_or(1);
            }
        }
    }
    parts
}

/// Linear page-to-chapter matcher.
///
/// Feed content ids in ascending order; each call returns the index of the
/// containing span, or `None` for ids outside every chapter.
pub struct ChapterAssigner<'a> {
    spans: &'a [ChapterSpan],
    cursor: usize,
}

impl<'a> ChapterAssigner<'a> {
    /// Starts a matcher over spans sorted by `start_id`.
    pub fn new(spans: &'a [ChapterSpan]) -> Self {
        Self { spans, cursor: 0 }
    }

    /// Span index containing `content_id`, advancing the cursor as needed.
    pub fn assign(&mut self, content_id: i64) -> Option<usize> {
        while self.cursor < self.spans.len() && content_id > self.spans[self.cursor].end_id {
            self.cursor += 1;
        }
        let span = self.spans.get(self.cursor)?;
        (content_id >= span.start_id).then_some(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_row(id: i64, title: &str) -> IndexRow {
        IndexRow { id, title: title.to_string(), level: 1 }
    }

    fn content_row(id: i64, part: Option<i64>) -> ContentRow {
        ContentRow { id, page: 1, part, text: String::new(), html: String::new() }
    }

    #[test]
    fn test_spans_cover_half_open_intervals() {
        // E1: headings at ids 1 and 3 over content 1..=3
        let rows = vec![index_row(1, "المقدمة"), index_row(3, "الباب الأول")];
        let spans = chapter_spans(&rows, 3);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start_id, spans[0].end_id), (1, 2));
        assert_eq!((spans[1].start_id, spans[1].end_id), (3, 3));
    }

    #[test]
    fn test_last_span_extends_to_max_content_id() {
        let rows = vec![index_row(5, "باب")];
        let spans = chapter_spans(&rows, 40);
        assert_eq!((spans[0].start_id, spans[0].end_id), (5, 40));
    }

    #[test]
    fn test_unsorted_index_rows_are_sorted_first() {
        let rows = vec![index_row(9, "ثان"), index_row(2, "أول")];
        let spans = chapter_spans(&rows, 12);
        assert_eq!((spans[0].start_id, spans[0].end_id), (2, 8));
        assert_eq!((spans[1].start_id, spans[1].end_id), (9, 12));
    }

    #[test]
    fn test_empty_heading_gets_generated_title() {
        let spans = chapter_spans(&[index_row(7, "")], 9);
        assert_eq!(spans[0].title, "فصل 7");
    }

    #[test]
    fn test_no_index_rows_yield_no_spans() {
        assert!(chapter_spans(&[], 100).is_empty());
    }

    #[test]
    fn test_assigner_contains_each_page_exactly_once() {
        let rows = vec![index_row(1, "أ"), index_row(3, "ب")];
        let spans = chapter_spans(&rows, 3);
        let mut assigner = ChapterAssigner::new(&spans);
        assert_eq!(assigner.assign(1), Some(0));
        assert_eq!(assigner.assign(2), Some(0));
        assert_eq!(assigner.assign(3), Some(1));
    }

    #[test]
    fn test_pages_before_first_chapter_are_unassigned() {
        let spans = chapter_spans(&[index_row(10, "باب")], 20);
        let mut assigner = ChapterAssigner::new(&spans);
        assert_eq!(assigner.assign(4), None);
        assert_eq!(assigner.assign(9), None);
        assert_eq!(assigner.assign(10), Some(0));
        assert_eq!(assigner.assign(25), None);
    }

    #[test]
    fn test_span_parts_take_first_page_in_interval() {
        let rows = vec![index_row(1, "أ"), index_row(3, "ب")];
        let spans = chapter_spans(&rows, 3);
        let content = vec![
            content_row(1, Some(1)),
            content_row(2, Some(1)),
            content_row(3, Some(2)),
        ];
        let refs: Vec<&ContentRow> = content.iter().collect();
        assert_eq!(span_parts(&spans, &refs), vec![1, 2]);
    }

    #[test]
    fn test_span_parts_bucket_null_to_one() {
        let spans = chapter_spans(&[index_row(1, "أ")], 2);
        let content = vec![content_row(1, None), content_row(2, Some(3))];
        let refs: Vec<&ContentRow> = content.iter().collect();
        assert_eq!(span_parts(&spans, &refs), vec![1]);
    }

    #[test]
    fn test_span_with_no_pages_defaults_to_part_one() {
        let rows = vec![index_row(1, "أ"), index_row(50, "ب")];
        let spans = chapter_spans(&rows, 60);
        let content = vec![content_row(1, Some(4))];
        let refs: Vec<&ContentRow> = content.iter().collect();
        assert_eq!(span_parts(&spans, &refs), vec![4, 1]);
    }
}
