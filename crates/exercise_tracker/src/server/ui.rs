use axum::{Router, response::Html, routing::get};

use super::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Exercise Tracker</title>
  <style>
    body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }
    form { display: grid; gap: 0.5rem; margin-bottom: 2rem; }
    code { background: #eee; padding: 0 0.2rem; }
  </style>
</head>
<body>
  <h1>Exercise Tracker</h1>

  <form action="/api/users" method="post">
    <h2>Create a new user</h2>
    <input name="username" placeholder="username" required>
    <button type="submit">Submit</button>
  </form>

  <form id="exercise-form" method="post">
    <h2>Add exercises</h2>
    <input id="uid" name="_id" placeholder=":_id" required>
    <input name="description" placeholder="description*" required>
    <input name="duration" placeholder="duration* (mins.)" required>
    <input name="date" placeholder="date (yyyy-mm-dd)">
    <button type="submit">Submit</button>
  </form>

  <p>
    <code>GET /api/users/:_id/logs?[from][&amp;to][&amp;limit]</code><br>
    <code>from</code> and <code>to</code> are dates (yyyy-mm-dd); <code>limit</code> is a number.
  </p>

  <script>
    const exerciseForm = document.getElementById('exercise-form');
    exerciseForm.addEventListener('submit', () => {
      const userId = document.getElementById('uid').value;
      exerciseForm.action = `/api/users/${encodeURIComponent(userId)}/exercises`;
    });
  </script>
</body>
</html>
"#;
