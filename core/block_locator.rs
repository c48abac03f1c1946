use scraper::{ElementRef, Node};

pub const DEFAULT_SIBLING_SEARCH_BUDGET: usize = 5;

const CODE_BLOCK_TAG: &str = "pre";
const GENERIC_CONTAINER_TAGS: [&str; 3] = ["div", "section", "figure"];

/// Finds the code-block container belonging to a heading.
///
/// First the heading's immediate next sibling (ignoring whitespace-only text and comments)
/// is checked: a `<pre>` is taken as-is, a generic container is searched for one. Failing
/// that, up to `budget` following element siblings are tried, each accepted if it is or
/// contains a `<pre>`.
pub fn locate_code_block<'a>(heading: ElementRef<'a>, budget: usize) -> Option<ElementRef<'a>> {
    if let Some(sibling) = immediate_sibling_element(heading) {
        if is_code_block(&sibling) {
            return Some(sibling);
        }
        if GENERIC_CONTAINER_TAGS.contains(&sibling.value().name()) {
            if let Some(found) = first_descendant_code_block(sibling) {
                return Some(found);
            }
        }
    }

    following_elements(heading)
        .take(budget)
        .find_map(|sibling| {
            if is_code_block(&sibling) {
                Some(sibling)
            } else {
                first_descendant_code_block(sibling)
            }
        })
}

pub fn is_code_block(element: &ElementRef<'_>) -> bool {
    element.value().name() == CODE_BLOCK_TAG
}

fn first_descendant_code_block(container: ElementRef<'_>) -> Option<ElementRef<'_>> {
    container
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(is_code_block)
}

// None when the next meaningful sibling is visible text rather than an element.
fn immediate_sibling_element(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    for node in heading.next_siblings() {
        match node.value() {
            Node::Text(text) if text.trim().is_empty() => continue,
            Node::Comment(_) => continue,
            Node::Element(_) => return ElementRef::wrap(node),
            _ => return None,
        }
    }
    None
}

fn following_elements(heading: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    heading.next_siblings().filter_map(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn locate(html: &str, budget: usize) -> Option<String> {
        let doc = Html::parse_document(html);
        let h = Selector::parse("h3").unwrap();
        let heading = doc.select(&h).next().expect("heading present");
        locate_code_block(heading, budget).map(|el| el.text().collect::<String>())
    }

    #[test]
    fn takes_directly_following_pre() {
        assert_eq!(locate("<h3>a.rs</h3>\n  <pre>one</pre>", 5).as_deref(), Some("one"));
    }

    #[test]
    fn searches_inside_wrapper_container() {
        let html = r#"<h3>a.rs</h3><div class="code-wrap"><div class="toolbar">rust</div><pre>two</pre></div>"#;
        assert_eq!(locate(html, 5).as_deref(), Some("two"));
    }

    #[test]
    fn skips_interleaved_prose_within_budget() {
        let html = "<h3>a.rs</h3><p>Here is the file:</p><p>Note.</p><pre>three</pre>";
        assert_eq!(locate(html, 5).as_deref(), Some("three"));
    }

    #[test]
    fn stops_after_budget() {
        let html = "<h3>a.rs</h3><p>1</p><p>2</p><p>3</p><p>4</p><p>5</p><pre>late</pre>";
        assert_eq!(locate(html, 5), None);
        assert_eq!(locate(html, 6).as_deref(), Some("late"));
    }

    #[test]
    fn visible_text_sibling_falls_through_to_forward_search() {
        let html = "<div><h3>a.rs</h3>loose text<pre>four</pre></div>";
        assert_eq!(locate(html, 5).as_deref(), Some("four"));
    }

    #[test]
    fn comments_are_not_siblings() {
        let html = "<h3>a.rs</h3><!-- generated --><pre>five</pre>";
        assert_eq!(locate(html, 5).as_deref(), Some("five"));
    }

    #[test]
    fn no_container_yields_none() {
        assert_eq!(locate("<h3>a.rs</h3><p>nothing here</p>", 5), None);
        assert_eq!(locate("<h3>a.rs</h3>", 5), None);
    }

    #[test]
    fn nested_pre_in_non_generic_sibling_is_found_by_forward_search() {
        let html = "<h3>a.rs</h3><details><summary>show</summary><pre>six</pre></details>";
        assert_eq!(locate(html, 5).as_deref(), Some("six"));
    }
}
