use crate::llm::prompts::Labels;
use crate::models::Verdict;

/// Maps a raw completion onto a verdict. Only an exact label match (after
/// trimming surrounding whitespace) counts; nothing is coerced.
pub fn parse_verdict(response: &str, labels: &Labels) -> Verdict {
    let answer = response.trim();

    if answer == labels.related {
        Verdict::Related
    } else if answer == labels.mentioned_only {
        Verdict::MentionedOnly
    } else if answer == labels.unrelated {
        Verdict::Unrelated
    } else {
        Verdict::Unparseable {
            raw: answer.to_string(),
        }
    }
}
