//! Sentence-aware splitter that turns cleaned text into bounded-size
//! speakable chunks for the synthesis service.
//!
//! Chunks are packed greedily toward `target_len` and a single sentence may
//! overflow the target, but nothing ever exceeds `target_len *
//! HARD_CAP_FACTOR`: oversized fragments are force-split at fixed character
//! boundaries.

/// A lone sentence may overflow the packing target, but never this multiple
/// of it.
pub const HARD_CAP_FACTOR: usize = 2;

struct Fragment {
    text: String,
    ends_paragraph: bool,
}

/// Split `text` into ordered, non-empty chunks of at most
/// `target_len * HARD_CAP_FACTOR` characters each.
///
/// Empty or whitespace-only input yields an empty vector; callers treat that
/// as a validation error.
pub fn segment(text: &str, target_len: usize) -> Vec<String> {
    let target = target_len.max(1);
    pack_fragments(split_fragments(text), target, target * HARD_CAP_FACTOR)
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…' | '。' | '！' | '？' | '；')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '”' | '’' | '」' | '』' | '）')
}

/// A period glued to a following digit is a decimal point ("3.14", "$.99"),
/// never a sentence end.
fn ends_sentence(chars: &[char], i: usize) -> bool {
    if chars[i] == '.' {
        if let Some(next) = chars.get(i + 1) {
            if next.is_ascii_digit() {
                return false;
            }
        }
    }
    true
}

fn split_fragments(text: &str) -> Vec<Fragment> {
    let chars: Vec<char> = text.chars().collect();
    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            let mut j = i;
            while j < chars.len() && chars[j] == '\n' {
                j += 1;
            }
            if j - i >= 2 {
                // blank line: hard paragraph boundary
                push_fragment(&mut fragments, &mut current, true);
            } else {
                current.push(' ');
            }
            i = j;
            continue;
        }

        current.push(c);

        if is_terminator(c) && ends_sentence(&chars, i) {
            // keep trailing punctuation runs and closing quotes with their
            // sentence ("Done?!", "he said.")
            while i + 1 < chars.len() && (is_terminator(chars[i + 1]) || is_closing(chars[i + 1])) {
                i += 1;
                current.push(chars[i]);
            }
            push_fragment(&mut fragments, &mut current, false);
        }

        i += 1;
    }

    push_fragment(&mut fragments, &mut current, false);
    fragments
}

fn push_fragment(fragments: &mut Vec<Fragment>, current: &mut String, ends_paragraph: bool) {
    let text = current.trim().to_string();
    current.clear();
    if text.is_empty() {
        // propagate a paragraph boundary onto the previous fragment so the
        // packer still sees it
        if ends_paragraph {
            if let Some(last) = fragments.last_mut() {
                last.ends_paragraph = true;
            }
        }
        return;
    }
    fragments.push(Fragment {
        text,
        ends_paragraph,
    });
}

fn pack_fragments(fragments: Vec<Fragment>, target: usize, hard_cap: usize) -> Vec<String> {
    let soft_flush = (target / 2).max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    let flush = |current: &mut String, current_len: &mut usize, chunks: &mut Vec<String>| {
        if *current_len > 0 {
            chunks.push(std::mem::take(current));
            *current_len = 0;
        }
    };

    for fragment in fragments {
        let len = fragment.text.chars().count();

        if len > hard_cap {
            flush(&mut current, &mut current_len, &mut chunks);
            chunks.extend(force_split(&fragment.text, hard_cap));
        } else if current_len == 0 {
            current = fragment.text;
            current_len = len;
        } else if current_len + 1 + len <= target {
            current.push(' ');
            current.push_str(&fragment.text);
            current_len += 1 + len;
        } else {
            flush(&mut current, &mut current_len, &mut chunks);
            current = fragment.text;
            current_len = len;
        }

        // prefer breaking at a paragraph once the chunk is reasonably full
        if fragment.ends_paragraph && current_len >= soft_flush {
            flush(&mut current, &mut current_len, &mut chunks);
        }
    }

    flush(&mut current, &mut current_len, &mut chunks);
    chunks
}

fn force_split(text: &str, max_len: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_len)
        .map(|piece| piece.iter().collect::<String>().trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}
