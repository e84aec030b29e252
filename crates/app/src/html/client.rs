pub(crate) const CLIENT_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Finger Counter &mdash; client side</title>
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
    .stage { position: relative; width: 640px; height: 480px; }
    video, canvas {
      position: absolute;
      top: 0;
      left: 0;
      border: 2px solid #444;
      border-radius: 6px;
    }
    video { visibility: hidden; }
    #finger-count { font-size: 1.5rem; color: #6f6; }
    button {
      background: #222;
      color: #eee;
      border: 1px solid #555;
      border-radius: 4px;
      padding: 0.4rem 1rem;
      cursor: pointer;
    }
    a { color: #6cf; }
  </style>
  <script src="https://cdn.jsdelivr.net/npm/@tensorflow/tfjs-core"></script>
  <script src="https://cdn.jsdelivr.net/npm/@tensorflow/tfjs-converter"></script>
  <script src="https://cdn.jsdelivr.net/npm/@tensorflow/tfjs-backend-webgl"></script>
  <script src="https://cdn.jsdelivr.net/npm/@mediapipe/hands"></script>
  <script src="https://cdn.jsdelivr.net/npm/@tensorflow-models/hand-pose-detection"></script>
  <script src="/static/js/client_side_implementation.js"></script>
</head>
<body>
  <h1>Finger Counter &mdash; in your browser</h1>
  <div class="stage">
    <video id="webcam" width="640" height="480" autoplay playsinline></video>
    <canvas id="output-canvas" width="640" height="480"></canvas>
  </div>
  <div id="finger-count">Fingers: 0</div>
  <div id="status">Waiting for camera...</div>
  <button id="start-button">Start Detection</button>
  <p><a href="/">Back to the server stream</a></p>
</body>
</html>
"#;
