use serde::Serialize;

/// Boundary marker the question-generation model emits between questions.
/// Decoding with special tokens skipped can leave it as `sep>` or `<sep>`.
pub const SEPARATOR: &str = "sep>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    /// 1-based position in the generated list.
    pub id: usize,
    #[serde(rename = "question")]
    pub text: String,
}

/// Split one combined output into questions on line breaks and separators.
///
/// Candidates are trimmed and empty ones dropped; order is preserved. An
/// output with nothing but separators and whitespace yields an empty list.
#[must_use]
pub fn parse_combined(raw: &str) -> Vec<Question> {
    raw.replace("<sep>", "\n")
        .replace(SEPARATOR, "\n")
        .lines()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .enumerate()
        .map(|(i, q)| Question {
            id: i + 1,
            text: q.to_owned(),
        })
        .collect()
}

/// Wrap one output per prompt as a question, trimmed, with a sequential id.
///
/// Every output becomes exactly one entry, even when it is blank.
#[must_use]
pub fn parse_templated<S: AsRef<str>>(outputs: &[S]) -> Vec<Question> {
    outputs
        .iter()
        .enumerate()
        .map(|(i, raw)| Question {
            id: i + 1,
            text: raw.as_ref().trim().to_owned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(questions: &[Question]) -> Vec<&str> {
        questions.iter().map(|q| q.text.as_str()).collect()
    }

    #[test]
    fn splits_on_separator_and_newlines() {
        let questions = parse_combined("What is AI?sep>How does ML work?\n\n");
        assert_eq!(texts(&questions), vec!["What is AI?", "How does ML work?"]);
        assert_eq!(questions[0].id, 1);
        assert_eq!(questions[1].id, 2);
    }

    #[test]
    fn full_sep_token_leaves_no_bracket() {
        let questions = parse_combined("Who wrote Hamlet? <sep> When was it written? <sep>");
        assert_eq!(
            texts(&questions),
            vec!["Who wrote Hamlet?", "When was it written?"]
        );
    }

    #[test]
    fn crlf_and_padding_trimmed() {
        let questions = parse_combined("  First?  \r\n\r\n\t Second? \n");
        assert_eq!(texts(&questions), vec!["First?", "Second?"]);
    }

    #[test]
    fn blank_output_is_empty_list() {
        assert!(parse_combined("").is_empty());
        assert!(parse_combined(" sep> \n\n sep>").is_empty());
    }

    #[test]
    fn templated_keeps_one_entry_per_output() {
        let outputs = vec![
            " What is a cell? ".to_owned(),
            String::new(),
            "Why do cells divide?\n".to_owned(),
        ];
        let questions = parse_templated(&outputs);
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0].text, "What is a cell?");
        assert_eq!(questions[1].text, "");
        assert_eq!(
            questions.iter().map(|q| q.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn templated_does_not_split() {
        let questions = parse_templated(&["A?sep>B?"]);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "A?sep>B?");
    }

    #[test]
    fn question_serializes_as_question_field() {
        let json = serde_json::to_value(Question {
            id: 3,
            text: "Why?".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"id": 3, "question": "Why?"}));
    }

    mod proptest_parser {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn no_empty_questions_and_sequential_ids(raw in "[a-zA-Z ?\\n]{0,40}(sep>[a-zA-Z ?\\n]{0,40}){0,6}") {
                let questions = parse_combined(&raw);
                for (i, q) in questions.iter().enumerate() {
                    prop_assert!(!q.text.is_empty());
                    prop_assert_eq!(q.text.trim(), q.text.as_str());
                    prop_assert_eq!(q.id, i + 1);
                }
            }

            #[test]
            fn order_of_segments_preserved(segments in proptest::collection::vec("[a-zA-Z][a-zA-Z ]{0,20}\\?", 0..8)) {
                let raw = segments.join("sep>");
                let questions = parse_combined(&raw);
                let expected: Vec<String> = segments.iter().map(|s| s.trim().to_owned()).collect();
                let got: Vec<String> = questions.into_iter().map(|q| q.text).collect();
                prop_assert_eq!(got, expected);
            }
        }
    }
}
