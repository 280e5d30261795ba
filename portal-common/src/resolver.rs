//! Tree path resolution
//!
//! A path addresses one node of the four-level tree by identifier equality at
//! every level. A path resolves only if every ancestor segment matches; a
//! stale segment anywhere yields `None`, which callers treat as an ordinary
//! outcome (the node was deleted by an earlier action).

use std::fmt;

use crate::model::{Lesson, Module, Organization, Phase};

/// Address of a module: organization → phase → module
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModulePath {
    pub organization_id: String,
    pub phase_id: String,
    pub module_id: String,
}

impl ModulePath {
    pub fn new(
        organization_id: impl Into<String>,
        phase_id: impl Into<String>,
        module_id: impl Into<String>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            phase_id: phase_id.into(),
            module_id: module_id.into(),
        }
    }

    /// Path of a lesson inside this module
    pub fn lesson(&self, lesson_id: impl Into<String>) -> LessonPath {
        LessonPath {
            organization_id: self.organization_id.clone(),
            phase_id: self.phase_id.clone(),
            module_id: self.module_id.clone(),
            lesson_id: lesson_id.into(),
        }
    }
}

/// Address of a lesson: organization → phase → module → lesson
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LessonPath {
    pub organization_id: String,
    pub phase_id: String,
    pub module_id: String,
    pub lesson_id: String,
}

impl LessonPath {
    pub fn new(
        organization_id: impl Into<String>,
        phase_id: impl Into<String>,
        module_id: impl Into<String>,
        lesson_id: impl Into<String>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            phase_id: phase_id.into(),
            module_id: module_id.into(),
            lesson_id: lesson_id.into(),
        }
    }

    /// Path of the parent module
    pub fn module(&self) -> ModulePath {
        ModulePath::new(&self.organization_id, &self.phase_id, &self.module_id)
    }
}

/// Address of any node of the tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TreePath {
    Organization {
        organization_id: String,
    },
    Phase {
        organization_id: String,
        phase_id: String,
    },
    Module(ModulePath),
    Lesson(LessonPath),
}

impl TreePath {
    pub fn organization(organization_id: impl Into<String>) -> Self {
        TreePath::Organization {
            organization_id: organization_id.into(),
        }
    }

    pub fn phase(organization_id: impl Into<String>, phase_id: impl Into<String>) -> Self {
        TreePath::Phase {
            organization_id: organization_id.into(),
            phase_id: phase_id.into(),
        }
    }

    pub fn organization_id(&self) -> &str {
        match self {
            TreePath::Organization { organization_id } => organization_id,
            TreePath::Phase { organization_id, .. } => organization_id,
            TreePath::Module(path) => &path.organization_id,
            TreePath::Lesson(path) => &path.organization_id,
        }
    }

    /// Identifier of the addressed node itself
    pub fn leaf_id(&self) -> &str {
        match self {
            TreePath::Organization { organization_id } => organization_id,
            TreePath::Phase { phase_id, .. } => phase_id,
            TreePath::Module(path) => &path.module_id,
            TreePath::Lesson(path) => &path.lesson_id,
        }
    }

    /// Path of the enclosing node; `None` for an organization
    pub fn parent(&self) -> Option<TreePath> {
        match self {
            TreePath::Organization { .. } => None,
            TreePath::Phase {
                organization_id, ..
            } => Some(TreePath::organization(organization_id)),
            TreePath::Module(path) => Some(TreePath::phase(&path.organization_id, &path.phase_id)),
            TreePath::Lesson(path) => Some(TreePath::Module(path.module())),
        }
    }
}

impl From<ModulePath> for TreePath {
    fn from(path: ModulePath) -> Self {
        TreePath::Module(path)
    }
}

impl From<LessonPath> for TreePath {
    fn from(path: LessonPath) -> Self {
        TreePath::Lesson(path)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreePath::Organization { organization_id } => write!(f, "{}", organization_id),
            TreePath::Phase {
                organization_id,
                phase_id,
            } => write!(f, "{}/{}", organization_id, phase_id),
            TreePath::Module(path) => fmt::Display::fmt(path, f),
            TreePath::Lesson(path) => fmt::Display::fmt(path, f),
        }
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.organization_id, self.phase_id, self.module_id)
    }
}

impl fmt::Display for LessonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.organization_id, self.phase_id, self.module_id, self.lesson_id
        )
    }
}

/// Shared reference to a resolved node
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Organization(&'a Organization),
    Phase(&'a Phase),
    Module(&'a Module),
    Lesson(&'a Lesson),
}

impl<'a> NodeRef<'a> {
    pub fn as_lesson(self) -> Option<&'a Lesson> {
        match self {
            NodeRef::Lesson(lesson) => Some(lesson),
            _ => None,
        }
    }
}

/// Mutable reference to a resolved node
#[derive(Debug)]
pub enum NodeMut<'a> {
    Organization(&'a mut Organization),
    Phase(&'a mut Phase),
    Module(&'a mut Module),
    Lesson(&'a mut Lesson),
}

// ========================================
// Lookup
// ========================================

pub fn find_organization<'a>(orgs: &'a [Organization], organization_id: &str) -> Option<&'a Organization> {
    orgs.iter().find(|o| o.id == organization_id)
}

pub fn find_organization_by_slug<'a>(orgs: &'a [Organization], slug: &str) -> Option<&'a Organization> {
    orgs.iter().find(|o| o.slug == slug)
}

/// Resolve `path` against the collection
pub fn resolve<'a>(orgs: &'a [Organization], path: &TreePath) -> Option<NodeRef<'a>> {
    let org = find_organization(orgs, path.organization_id())?;
    match path {
        TreePath::Organization { .. } => Some(NodeRef::Organization(org)),
        TreePath::Phase { phase_id, .. } => find_phase(org, phase_id).map(NodeRef::Phase),
        TreePath::Module(path) => {
            let phase = find_phase(org, &path.phase_id)?;
            find_module(phase, &path.module_id).map(NodeRef::Module)
        }
        TreePath::Lesson(path) => {
            let phase = find_phase(org, &path.phase_id)?;
            let module = find_module(phase, &path.module_id)?;
            module
                .lessons
                .iter()
                .find(|l| l.id == path.lesson_id)
                .map(NodeRef::Lesson)
        }
    }
}

/// Resolve a lesson path to the lesson itself
pub fn resolve_lesson<'a>(orgs: &'a [Organization], path: &LessonPath) -> Option<&'a Lesson> {
    resolve(orgs, &TreePath::Lesson(path.clone())).and_then(NodeRef::as_lesson)
}

/// Search an organization for a lesson id and return its full path
pub fn locate_lesson(orgs: &[Organization], organization_id: &str, lesson_id: &str) -> Option<LessonPath> {
    let org = find_organization(orgs, organization_id)?;
    org.phases.iter().find_map(|phase| {
        phase.modules.iter().find_map(|module| {
            module
                .lessons
                .iter()
                .any(|l| l.id == lesson_id)
                .then(|| LessonPath::new(&org.id, &phase.id, &module.id, lesson_id))
        })
    })
}

/// Mutable counterpart of [`resolve`]
pub fn resolve_mut<'a>(orgs: &'a mut [Organization], path: &TreePath) -> Option<NodeMut<'a>> {
    let org = orgs.iter_mut().find(|o| o.id == path.organization_id())?;
    match path {
        TreePath::Organization { .. } => Some(NodeMut::Organization(org)),
        TreePath::Phase { phase_id, .. } => org
            .phases
            .iter_mut()
            .find(|p| p.id == *phase_id)
            .map(NodeMut::Phase),
        TreePath::Module(path) => org
            .phases
            .iter_mut()
            .find(|p| p.id == path.phase_id)?
            .modules
            .iter_mut()
            .find(|m| m.id == path.module_id)
            .map(NodeMut::Module),
        TreePath::Lesson(path) => org
            .phases
            .iter_mut()
            .find(|p| p.id == path.phase_id)?
            .modules
            .iter_mut()
            .find(|m| m.id == path.module_id)?
            .lessons
            .iter_mut()
            .find(|l| l.id == path.lesson_id)
            .map(NodeMut::Lesson),
    }
}

fn find_phase<'a>(org: &'a Organization, phase_id: &str) -> Option<&'a Phase> {
    org.phases.iter().find(|p| p.id == phase_id)
}

fn find_module<'a>(phase: &'a Phase, module_id: &str) -> Option<&'a Module> {
    phase.modules.iter().find(|m| m.id == module_id)
}
