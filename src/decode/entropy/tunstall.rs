use crate::shared::entropy::tunstall::{build_dictionary, SymbolProbability};
use super::Err;

/// Expands Tunstall words back into exactly 'output_size' bytes.
///
/// Every byte of 'data' is a dictionary index. The word of the last byte may reach past the
/// end of the original data; only the part that fits is kept. With a single symbol the
/// data is empty and the output is that symbol repeated.
pub(crate) fn decompress(
    probabilities: &[SymbolProbability],
    data: &[u8],
    output_size: usize,
) -> Result<Vec<u8>, Err> {
    match probabilities {
        [] => {
            return if output_size == 0 { Ok(Vec::new()) } else { Err(Err::EmptyAlphabet(output_size)) };
        },
        [p] => return Ok(vec![p.symbol; output_size]),
        _ => {},
    }

    let dictionary = build_dictionary(probabilities);
    let longest = dictionary.words().map(<[u8]>::len).max().unwrap_or(0);
    if output_size > data.len().saturating_mul(longest) {
        return Err(Err::SizeMismatch { expected: output_size, found: data.len().saturating_mul(longest) });
    }
    let mut output = Vec::with_capacity(output_size);
    let last = data.len().saturating_sub(1);
    for (i, &index) in data.iter().enumerate() {
        let word = dictionary.word(index as usize)
            .ok_or(Err::InvalidWord { index, dictionary_size: dictionary.len() })?;
        let remaining = output_size - output.len();
        if i == last {
            if word.len() < remaining {
                break;
            }
            output.extend_from_slice(&word[..remaining]);
        } else if word.len() > remaining {
            return Err(Err::Overrun(output_size));
        } else {
            output.extend_from_slice(word);
        }
    }

    if output.len() != output_size {
        return Err(Err::SizeMismatch { expected: output_size, found: output.len() });
    }
    Ok(output)
}
