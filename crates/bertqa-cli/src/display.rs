//! Console rendering for answers and device info.

use bertqa_core::{Answer, Delegate, DeviceCapabilities};

const MAX_TEXT_WIDTH: usize = 60;

/// Ranked table of answers followed by the inference time.
pub fn render_answers(answers: &[Answer], inference_time_ms: u64) -> String {
    let mut out = String::new();
    if answers.is_empty() {
        out.push_str("  (no answer found)\n");
    } else {
        out.push_str(&format!(
            "  {:>2}  {:<width$}  {:>8}  {}\n",
            "#",
            "answer",
            "logit",
            "span",
            width = MAX_TEXT_WIDTH
        ));
        for (i, answer) in answers.iter().enumerate() {
            out.push_str(&format!(
                "  {:>2}  {:<width$}  {:>8.3}  {}..{}\n",
                i + 1,
                truncate(&answer.text, MAX_TEXT_WIDTH),
                answer.pos.logit,
                answer.pos.start,
                answer.pos.end,
                width = MAX_TEXT_WIDTH
            ));
        }
    }
    out.push_str(&format!("  inference time: {inference_time_ms} ms\n"));
    out
}

/// JSON document with the answers and the inference time.
pub fn answers_json(answers: &[Answer], inference_time_ms: u64) -> serde_json::Value {
    serde_json::json!({
        "answers": answers,
        "inference_time_ms": inference_time_ms,
    })
}

pub fn render_device(caps: &impl DeviceCapabilities, delegate: Delegate) -> String {
    format!(
        "  gpu delegate:     {}\n  platform version: {}\n  selected:         {delegate}\n",
        if caps.gpu_delegate_supported() {
            "supported"
        } else {
            "unsupported"
        },
        caps.platform_version(),
    )
}

fn truncate(s: &str, max_chars: usize) -> String {
    let single_line = s.replace('\n', " ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let cut: String = single_line.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bertqa_core::DeviceProfile;

    #[test]
    fn renders_ranked_rows() {
        let answers = vec![
            Answer::new("15 April 2026", 40, 53, 11.25),
            Answer::new("April 2026", 43, 53, 9.5),
        ];
        let out = render_answers(&answers, 42);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("15 April 2026"));
        assert!(lines[1].contains("11.250"));
        assert!(lines[1].contains("40..53"));
        assert!(lines[2].trim_start().starts_with('2'));
        assert!(lines[3].contains("42 ms"));
    }

    #[test]
    fn renders_empty_answers() {
        let out = render_answers(&[], 7);
        assert!(out.contains("no answer found"));
        assert!(out.contains("7 ms"));
    }

    #[test]
    fn long_answers_are_truncated() {
        let long = "word ".repeat(40);
        let out = render_answers(&[Answer::new(long, 0, 200, 1.0)], 1);
        assert!(out.contains('…'));
    }

    #[test]
    fn json_carries_answers_and_time() {
        let value = answers_json(&[Answer::new("Rust Foundation", 50, 65, 8.0)], 12);
        assert_eq!(value["inference_time_ms"], 12);
        assert_eq!(value["answers"][0]["text"], "Rust Foundation");
        assert_eq!(value["answers"][0]["pos"]["start"], 50);
    }

    #[test]
    fn device_report() {
        let caps = DeviceProfile {
            gpu_delegate_supported: false,
            platform_version: 30,
        };
        let out = render_device(&caps, Delegate::Nnapi);
        assert!(out.contains("unsupported"));
        assert!(out.contains("30"));
        assert!(out.contains("nnapi"));
    }
}
