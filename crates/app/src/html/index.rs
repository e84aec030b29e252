pub(crate) const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Finger Counter</title>
  <style>
    body {
      font-family: system-ui, sans-serif;
      background: #111;
      color: #eee;
      display: flex;
      flex-direction: column;
      align-items: center;
      gap: 1rem;
      padding: 2rem;
    }
    img {
      border: 2px solid #444;
      border-radius: 6px;
      max-width: 100%;
    }
    a { color: #6cf; }
    .controls button {
      background: #222;
      color: #eee;
      border: 1px solid #555;
      border-radius: 4px;
      padding: 0.4rem 1rem;
      cursor: pointer;
    }
  </style>
</head>
<body>
  <h1>Finger Counter &mdash; server stream</h1>
  <img src="/video_feed" width="640" height="480" alt="live stream" />
  <div class="controls">
    <button onclick="fetch('/start').then(r => r.text()).then(t => note.textContent = t)">Start capture</button>
    <button onclick="fetch('/stop').then(r => r.text()).then(t => note.textContent = t)">Stop capture</button>
    <span id="note"></span>
  </div>
  <p>No camera on the server? Try the <a href="/client">client-side version</a>.</p>
</body>
</html>
"#;
