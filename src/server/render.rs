//! HTML rendering
//!
//! Renders directory listings and builds the links and form targets that
//! point back into the router.

use crate::storage::DirectoryListing;

/// Joins a child name onto a relative directory path
pub fn join_relative(directory: &str, name: &str) -> String {
    if directory.is_empty() {
        name.to_string()
    } else {
        format!("{directory}/{name}")
    }
}

/// Browse URL for a relative path, each segment percent-encoded
pub fn listing_href(relative_path: &str) -> String {
    let encoded: Vec<_> = relative_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(urlencoding::encode)
        .collect();
    format!("/{}", encoded.join("/"))
}

/// URL for an action route taking the relative path as `?path=`
pub fn action_href(action: &str, relative_path: &str) -> String {
    format!("/{}?path={}", action, urlencoding::encode(relative_path))
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders a directory listing page with upload and folder forms.
pub fn render_listing(listing: &DirectoryListing) -> String {
    let current = &listing.current_path;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>RAX Drive</title>\n</head>\n<body>\n<h1>RAX Drive</h1>\n");

    html.push_str(&format!(
        "<form action=\"{}\" method=\"post\">\n\
         <input type=\"text\" name=\"foldername\" placeholder=\"New folder name\" required>\n\
         <button type=\"submit\">Create Folder</button>\n</form>\n",
        escape_html(&action_href("create_folder", current))
    ));
    html.push_str(&format!(
        "<form action=\"{}\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" required>\n\
         <button type=\"submit\">Upload File</button>\n</form>\n",
        escape_html(&action_href("upload", current))
    ));

    html.push_str(&format!("<h3>Current path: /{}</h3>\n", escape_html(current)));

    if let Some(parent) = &listing.parent_path {
        html.push_str(&format!(
            "<p><a href=\"{}\">Go up</a></p>\n",
            escape_html(&listing_href(parent))
        ));
    }

    html.push_str("<ul>\n");
    for folder in &listing.folders {
        let path = join_relative(current, folder);
        html.push_str(&format!(
            "<li><a href=\"{}\">[dir] {}</a>\n\
             <form action=\"{}\" method=\"post\" onsubmit=\"return confirm('Delete this folder and all its contents?');\">\
             <button type=\"submit\">Delete</button></form></li>\n",
            escape_html(&listing_href(&path)),
            escape_html(folder),
            escape_html(&action_href("delete_folder", &path))
        ));
    }
    for file in &listing.files {
        let path = join_relative(current, file);
        html.push_str(&format!(
            "<li><a href=\"{}\" target=\"_blank\">{}</a>\n\
             <form action=\"{}\" method=\"post\" onsubmit=\"return confirm('Delete this file?');\">\
             <button type=\"submit\">Delete</button></form></li>\n",
            escape_html(&action_href("files", &path)),
            escape_html(file),
            escape_html(&action_href("delete_file", &path))
        ));
    }
    html.push_str("</ul>\n</body>\n</html>\n");

    html
}
