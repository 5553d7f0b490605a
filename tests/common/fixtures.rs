//! Page and payload fixtures for the mock news site

/// Login page with a hidden token, the credential inputs and an unnamed submit button
pub const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="fr">
<head><title>Connexion</title></head>
<body>
  <form method="get" action="/recherche"><input name="search_keywords" value=""></form>
  <form method="post" action="/sfuser/connexion">
    <input type="hidden" name="connection[_token]" value="tok-123">
    <input type="email" name="email" placeholder="Adresse email">
    <input type="password" name="password">
    <input type="checkbox" name="connection[stay_connected]" value="1">
    <input type="submit" value="Se connecter">
  </form>
</body>
</html>"#;

/// Page served when the site is down for maintenance
pub const MAINTENANCE_PAGE: &str = "<html><body><h1>Maintenance</h1></body></html>";

/// Bytes served as the article PDF
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\n%%EOF\n";

/// Name and value of the session cookie set by a successful login
pub const SESSION_COOKIE: (&str, &str) = ("lmd_a_s", "premium");

/// One page of comments with a nested reply
pub const COMMENTS_JSON: &str = r#"{
    "comments": [
        {
            "commentId": "c1",
            "userName": "Alice",
            "content": "Très bon article",
            "createdAt": "2024-03-01T08:30:00Z",
            "likes": 12,
            "parentId": null,
            "replies": [
                {
                    "commentId": "c2",
                    "userName": "Bob",
                    "content": "D'accord",
                    "createdAt": "2024-03-01T09:00:00Z",
                    "likes": 2,
                    "parentId": "c1",
                    "replies": []
                }
            ]
        },
        {
            "commentId": "c3",
            "userName": "Chloé",
            "content": "Pas convaincue",
            "createdAt": "2024-03-01T10:15:00Z",
            "likes": 5,
            "parentId": null
        }
    ]
}"#;
