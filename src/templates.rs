//! Sample cover notes for testing and demonstration.
//!
//! The markup mirrors what a TipTap editor emits: list items wrap their text
//! in `<p>`, alignment travels in `style="text-align: …"`.

/// A typical note: heading, aligned paragraphs, emphasis and both list kinds.
pub fn tiptap_note() -> &'static str {
    r##"<h1 style="text-align: center">Application documents</h1>
<p>Dear Ms. Schneider,</p>
<p>please find attached the documents for my application as <strong>Senior Engineer</strong>. The <em>certificates</em> are sorted by date, the <u>references</u> follow at the end.</p>
<h2>Contents</h2>
<ul>
<li><p>Curriculum vitae</p></li>
<li><p>Certificates</p>
<ul>
<li><p>University degree</p></li>
<li><p>Language certificate <em>(C1)</em></p></li>
</ul>
</li>
<li><p>References</p></li>
</ul>
<h3>Next steps</h3>
<ol>
<li><p>Review of the documents</p></li>
<li><p>Interview</p></li>
</ol>
<p style="text-align: right">Kind regards,<br>Jan Müller</p>"##
}

/// Three levels of mixed list nesting.
pub fn nested_lists_note() -> &'static str {
    r##"<ul>
<li>Fruit
<ol>
<li>Apples
<ul><li>Braeburn</li><li>Elstar</li></ul>
</li>
<li>Pears</li>
</ol>
</li>
<li>Vegetables</li>
</ul>
<ol><li>restart</li></ol>"##
}

/// Broken markup the parser must survive.
pub fn malformed_note() -> &'static str {
    r##"<p>Unclosed paragraph <strong>bold <em>both</p>
<h2>Heading without end
<ul><li>one<li>two</ul></div></span>
<p style="text-align:">empty style</p><p></p><blink>legacy tag</blink>
a < b && c > d <li>stray item"##
}

/// Enough paragraphs to fill more than one page.
pub fn long_note() -> String {
    let mut html = String::from("<h1>Long note</h1>");
    for i in 1..=80 {
        html.push_str(&format!(
            "<p>Paragraph {i}: the attached documents are listed below in merge order.</p>"
        ));
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::compile;
    use crate::markup::parse;

    #[test]
    fn notes_produce_primitives() {
        let long = long_note();
        let notes: Vec<(&str, &str)> = vec![
            ("tiptap", tiptap_note()),
            ("nested", nested_lists_note()),
            ("malformed", malformed_note()),
            ("long", &long),
        ];

        for (name, html) in notes {
            let primitives = compile(&parse(html));
            assert!(
                !primitives.is_empty(),
                "Note '{}' should compile to primitives",
                name
            );
        }
    }
}
