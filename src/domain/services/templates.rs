#[cfg(test)]
#[path = "templates_test.rs"]
mod tests;

use anyhow::Result;
use serde_json::json;
use serde_json::Value;

use crate::domain::models::GeneratedFile;
use crate::domain::models::OrchestratorError;
use crate::domain::models::ProjectKind;
use crate::domain::models::ProjectSpec;

/// Parameterized scaffolds for the template-backed project kinds.
/// Rendering is deterministic and side-effect-free: the same spec always
/// yields byte-identical files.
pub struct TemplateLibrary {}

impl TemplateLibrary {
    /// Kinds with a scaffold. The remaining `ProjectKind`s go through the
    /// full model-synthesis path instead.
    pub fn kinds() -> Vec<ProjectKind> {
        return vec![
            ProjectKind::NextJs,
            ProjectKind::React,
            ProjectKind::Vite,
            ProjectKind::Express,
            ProjectKind::Vanilla,
        ];
    }

    pub fn has_template(kind: ProjectKind) -> bool {
        return TemplateLibrary::kinds().contains(&kind);
    }

    pub fn render(kind: ProjectKind, spec: &ProjectSpec) -> Result<Vec<GeneratedFile>> {
        let (mut package_json, files) = match kind {
            ProjectKind::NextJs => nextjs_template(),
            ProjectKind::React => react_template(),
            ProjectKind::Vite => vite_template(),
            ProjectKind::Express => express_template(),
            ProjectKind::Vanilla => vanilla_template(),
            _ => {
                return Err(OrchestratorError::UnknownProjectKind(kind.to_string()).into());
            }
        };

        package_json["name"] = json!(spec.name);
        package_json["description"] = json!(spec.description);
        apply_tech_stack(&mut package_json, kind, &spec.tech_stack);

        let mut res = vec![GeneratedFile::from_template(
            "package.json",
            &format!("{}\n", serde_json::to_string_pretty(&package_json)?),
        )];

        for (path, content) in files {
            let content = content.replace("{project_name}", &spec.name);
            res.push(GeneratedFile::from_template(path, &content));
        }

        return Ok(res);
    }
}

/// Extra dev-dependencies driven by the requested tech-stack list.
fn apply_tech_stack(package_json: &mut Value, kind: ProjectKind, tech_stack: &[String]) {
    let has = |name: &str| {
        return tech_stack.iter().any(|entry| return entry == name);
    };

    if has("tailwindcss") {
        package_json["devDependencies"]["tailwindcss"] = json!("^3.3.0");
        package_json["devDependencies"]["autoprefixer"] = json!("^10.4.16");
        package_json["devDependencies"]["postcss"] = json!("^8.4.31");
    }

    if has("typescript") && kind != ProjectKind::NextJs {
        package_json["devDependencies"]["typescript"] = json!("^5.0.0");
    }
}

fn nextjs_template() -> (Value, Vec<(&'static str, &'static str)>) {
    let package_json = json!({
        "name": "",
        "version": "0.1.0",
        "private": true,
        "scripts": {
            "dev": "next dev",
            "build": "next build",
            "start": "next start",
            "lint": "next lint"
        },
        "dependencies": {
            "next": "14.0.0",
            "react": "^18",
            "react-dom": "^18"
        },
        "devDependencies": {
            "typescript": "^5",
            "@types/node": "^20",
            "@types/react": "^18",
            "@types/react-dom": "^18",
            "eslint": "^8",
            "eslint-config-next": "14.0.0"
        }
    });

    let files = vec![
        (
            "app/page.tsx",
            r#"import React from 'react';

export default function Home() {
  return (
    <main className="container mx-auto px-4 py-8">
      <h1 className="text-4xl font-bold text-center mb-8">
        Welcome to {project_name}
      </h1>
      <p className="text-lg text-center text-gray-600">
        Your Next.js application is ready!
      </p>
    </main>
  );
}
"#,
        ),
        (
            "app/layout.tsx",
            r#"import React from 'react';
import './globals.css';

export const metadata = {
  title: '{project_name}',
  description: 'Generated by autoforge',
};

export default function RootLayout({
  children,
}: {
  children: React.ReactNode;
}) {
  return (
    <html lang="en">
      <body>{children}</body>
    </html>
  );
}
"#,
        ),
        (
            "app/globals.css",
            r#"@tailwind base;
@tailwind components;
@tailwind utilities;

body {
  font-family: system-ui, sans-serif;
}
"#,
        ),
        (
            "next.config.js",
            r#"/** @type {import('next').NextConfig} */
const nextConfig = {};

module.exports = nextConfig;
"#,
        ),
        (
            "tailwind.config.js",
            r#"/** @type {import('tailwindcss').Config} */
module.exports = {
  content: [
    './pages/**/*.{js,ts,jsx,tsx,mdx}',
    './components/**/*.{js,ts,jsx,tsx,mdx}',
    './app/**/*.{js,ts,jsx,tsx,mdx}',
  ],
  theme: {
    extend: {},
  },
  plugins: [],
};
"#,
        ),
        (
            "tsconfig.json",
            r#"{
  "compilerOptions": {
    "target": "es5",
    "lib": ["dom", "dom.iterable", "es6"],
    "allowJs": true,
    "skipLibCheck": true,
    "strict": true,
    "forceConsistentCasingInFileNames": true,
    "noEmit": true,
    "esModuleInterop": true,
    "module": "esnext",
    "moduleResolution": "node",
    "resolveJsonModule": true,
    "isolatedModules": true,
    "jsx": "preserve",
    "incremental": true,
    "plugins": [
      {
        "name": "next"
      }
    ],
    "paths": {
      "@/*": ["./*"]
    }
  },
  "include": ["next-env.d.ts", "**/*.ts", "**/*.tsx", ".next/types/**/*.ts"],
  "exclude": ["node_modules"]
}
"#,
        ),
    ];

    return (package_json, files);
}

fn react_template() -> (Value, Vec<(&'static str, &'static str)>) {
    let package_json = json!({
        "name": "",
        "version": "0.1.0",
        "private": true,
        "dependencies": {
            "react": "^18.2.0",
            "react-dom": "^18.2.0",
            "react-scripts": "5.0.1"
        },
        "scripts": {
            "dev": "react-scripts start",
            "start": "react-scripts start",
            "build": "react-scripts build",
            "test": "react-scripts test"
        },
        "devDependencies": {}
    });

    let files = vec![
        (
            "public/index.html",
            r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{project_name}</title>
  </head>
  <body>
    <div id="root"></div>
  </body>
</html>
"#,
        ),
        (
            "src/index.js",
            r#"import React from 'react';
import ReactDOM from 'react-dom/client';
import App from './App';

const root = ReactDOM.createRoot(document.getElementById('root'));
root.render(<App />);
"#,
        ),
        (
            "src/App.js",
            r#"import React from 'react';
import './App.css';

function App() {
  return (
    <div className="App">
      <header className="App-header">
        <h1>Welcome to {project_name}</h1>
        <p>Your React application is ready!</p>
      </header>
    </div>
  );
}

export default App;
"#,
        ),
        (
            "src/App.css",
            r#".App {
  text-align: center;
}

.App-header {
  background-color: #282c34;
  padding: 20px;
  color: white;
  min-height: 100vh;
  display: flex;
  flex-direction: column;
  align-items: center;
  justify-content: center;
}
"#,
        ),
    ];

    return (package_json, files);
}

fn vite_template() -> (Value, Vec<(&'static str, &'static str)>) {
    let package_json = json!({
        "name": "",
        "version": "0.1.0",
        "private": true,
        "type": "module",
        "scripts": {
            "dev": "vite",
            "build": "vite build",
            "preview": "vite preview"
        },
        "dependencies": {},
        "devDependencies": {
            "vite": "^5.0.0"
        }
    });

    let files = vec![
        (
            "index.html",
            r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{project_name}</title>
  </head>
  <body>
    <div id="app"></div>
    <script type="module" src="/src/main.js"></script>
  </body>
</html>
"#,
        ),
        (
            "src/main.js",
            r#"import './style.css';

document.querySelector('#app').innerHTML = `
  <main>
    <h1>Welcome to {project_name}</h1>
    <p>Your Vite application is ready!</p>
  </main>
`;
"#,
        ),
        (
            "src/style.css",
            r#"body {
  font-family: system-ui, sans-serif;
  display: flex;
  min-height: 100vh;
  align-items: center;
  justify-content: center;
  margin: 0;
}

main {
  text-align: center;
}
"#,
        ),
        (
            "vite.config.js",
            r#"import { defineConfig } from 'vite';

export default defineConfig({
  server: {
    port: 3000,
    host: true,
  },
});
"#,
        ),
    ];

    return (package_json, files);
}

fn express_template() -> (Value, Vec<(&'static str, &'static str)>) {
    let package_json = json!({
        "name": "",
        "version": "0.1.0",
        "private": true,
        "scripts": {
            "dev": "node --watch server.js",
            "start": "node server.js",
            "build": "node --check server.js"
        },
        "dependencies": {
            "express": "^4.18.2"
        },
        "devDependencies": {}
    });

    let files = vec![(
        "server.js",
        r#"const express = require('express');

const app = express();
const port = process.env.PORT || 3000;

app.use(express.json());

app.get('/', (req, res) => {
  res.json({ message: 'Welcome to {project_name}' });
});

app.get('/health', (req, res) => {
  res.json({ status: 'ok' });
});

app.listen(port, () => {
  console.log(`{project_name} listening on port ${port}`);
});
"#,
    )];

    return (package_json, files);
}

fn vanilla_template() -> (Value, Vec<(&'static str, &'static str)>) {
    let package_json = json!({
        "name": "",
        "version": "0.1.0",
        "private": true,
        "scripts": {
            "dev": "serve -l 3000 .",
            "build": "node --check script.js"
        },
        "dependencies": {},
        "devDependencies": {
            "serve": "^14.2.0"
        }
    });

    let files = vec![
        (
            "index.html",
            r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{project_name}</title>
    <link rel="stylesheet" href="styles.css" />
  </head>
  <body>
    <main>
      <h1>Welcome to {project_name}</h1>
      <p>Your application is ready!</p>
    </main>
    <script src="script.js"></script>
  </body>
</html>
"#,
        ),
        (
            "styles.css",
            r#"body {
  font-family: system-ui, sans-serif;
  display: flex;
  min-height: 100vh;
  align-items: center;
  justify-content: center;
  margin: 0;
}

main {
  text-align: center;
}
"#,
        ),
        (
            "script.js",
            r#"document.addEventListener('DOMContentLoaded', () => {
  console.log('{project_name} loaded');
});
"#,
        ),
    ];

    return (package_json, files);
}
