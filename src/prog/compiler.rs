use crate::{
    error::CompileError,
    prog::{Config, Inst, InstPtr, Program},
    syntax::{
        ast::{
            Ast, Backref, BackrefTarget, Greed, Group, GroupKind, Repetition,
        },
        class::ClassSet,
    },
    util::{captures::GroupInfo, encoding::Encoding, look::Look},
};

const ERR_TOO_BIG: &str = "compiled program exceeds the configured size limit";
const ERR_DUPLICATE_NAME: &str = "duplicate capture group name";
const ERR_DANGLING_NUMBER: &str =
    "backreference to a group that does not exist";
const ERR_DANGLING_NAME: &str =
    "backreference to a group name that does not exist";

/// Compiles a parsed pattern into a [`Program`].
///
/// The compiler is very simple. The only tricky thing is patching jump and
/// split instructions to point to the right instruction once the target is
/// known.
#[derive(Debug)]
pub(crate) struct Compiler {
    config: Config,
    encoding: Encoding,
    insts: Vec<Inst>,
    group_info: GroupInfo,
    reg_len: usize,
    memoizable: bool,
}

impl Compiler {
    pub(crate) fn new(config: Config, encoding: Encoding) -> Compiler {
        Compiler {
            config,
            encoding,
            insts: vec![],
            group_info: GroupInfo::empty(),
            reg_len: 0,
            memoizable: true,
        }
    }

    /// Compile the given pattern. The capture table is built first, so that
    /// backreferences can refer to groups that appear after them.
    pub(crate) fn compile(
        mut self,
        ast: &Ast,
    ) -> Result<Program, CompileError> {
        self.group_info = group_info(ast)?;
        self.push(Inst::Save(0))?;
        self.c(ast)?;
        self.push(Inst::Save(1))?;
        self.push(Inst::Match)?;

        let anchored = is_anchored(ast);
        let mut prefix = String::new();
        literal_prefix(ast, &mut prefix);
        let prefix = if anchored || !self.encoding.is_ascii_compatible() {
            vec![]
        } else {
            self.encoding.encode_str(&prefix).unwrap_or_default()
        };
        debug!(
            "compiled program: {} instructions, {} groups, {} registers, \
             memoizable={}, anchored={}, prefix length {}",
            self.insts.len(),
            self.group_info.group_len(),
            self.reg_len,
            self.memoizable,
            anchored,
            prefix.len(),
        );
        Ok(Program {
            insts: self.insts,
            group_info: self.group_info,
            encoding: self.encoding,
            reg_len: self.reg_len,
            memoizable: self.memoizable,
            anchored,
            prefix,
        })
    }

    fn c(&mut self, ast: &Ast) -> Result<(), CompileError> {
        match *ast {
            Ast::Empty => {}
            Ast::Literal { ch, fold } => {
                if !fold {
                    self.push(Inst::Char(ch))?;
                } else {
                    let mut cls = ClassSet::from_char(ch);
                    cls.case_fold_simple();
                    self.c_class(&cls)?;
                }
            }
            Ast::Dot { dot_all } => {
                self.push(Inst::Any { dot_all })?;
            }
            Ast::Class(ref cls) => self.c_class(cls)?,
            Ast::Look(look) => {
                self.push(Inst::Look(look))?;
            }
            Ast::Repetition(ref rep) => self.c_repetition(rep)?,
            Ast::Group(ref group) => self.c_group(group)?,
            Ast::Concat(ref asts) => {
                for ast in asts.iter() {
                    self.c(ast)?;
                }
            }
            Ast::Alternation(ref asts) => self.c_alternation(asts)?,
            Ast::Backref(ref backref) => self.c_backref(backref)?,
        }
        Ok(())
    }

    fn c_class(&mut self, cls: &ClassSet) -> Result<(), CompileError> {
        match cls.single_char() {
            Some(ch) => self.push(Inst::Char(ch))?,
            None => self.push(Inst::Class(cls.clone()))?,
        };
        Ok(())
    }

    fn c_group(&mut self, group: &Group) -> Result<(), CompileError> {
        match group.kind {
            GroupKind::Capture { index, .. } => {
                self.push(Inst::Save(2 * index))?;
                self.c(&group.sub)?;
                self.push(Inst::Save(2 * index + 1))?;
            }
            GroupKind::NonCapture => self.c(&group.sub)?,
            GroupKind::Atomic => {
                self.memoizable = false;
                self.push(Inst::AtomicStart)?;
                self.c(&group.sub)?;
                self.push(Inst::AtomicEnd)?;
            }
            GroupKind::LookAhead { negate } => {
                self.memoizable = false;
                let start = self.push(Inst::LookStart { negate, next: 0 })?;
                self.c(&group.sub)?;
                self.push(Inst::LookEnd { negate })?;
                let next = self.insts.len();
                self.insts[start] = Inst::LookStart { negate, next };
            }
        }
        Ok(())
    }

    fn c_alternation(&mut self, asts: &[Ast]) -> Result<(), CompileError> {
        let mut jumps = vec![];
        for (i, ast) in asts.iter().enumerate() {
            if i + 1 == asts.len() {
                self.c(ast)?;
                break;
            }
            let split = self.empty_split()?;
            let x = self.insts.len();
            self.c(ast)?;
            jumps.push(self.empty_jump()?);
            let y = self.insts.len();
            self.set_split(split, x, y);
        }
        let end = self.insts.len();
        for jump in jumps {
            self.set_jump(jump, end);
        }
        Ok(())
    }

    fn c_repetition(&mut self, rep: &Repetition) -> Result<(), CompileError> {
        match rep.greed {
            Greed::Greedy => self.c_repeat(rep, true),
            Greed::Lazy => self.c_repeat(rep, false),
            Greed::Possessive => {
                self.memoizable = false;
                self.push(Inst::AtomicStart)?;
                self.c_repeat(rep, true)?;
                self.push(Inst::AtomicEnd)?;
                Ok(())
            }
        }
    }

    /// Compiles a repetition by emitting `min` copies of the sub-expression,
    /// followed by either a loop or `max - min` nested optional copies.
    ///
    /// A sub-expression that compiles to nothing only matches the empty
    /// string, and so does every repetition of it. Such a repetition emits
    /// nothing, no matter its bounds. Neither does `x{0}`.
    fn c_repeat(
        &mut self,
        rep: &Repetition,
        greedy: bool,
    ) -> Result<(), CompileError> {
        if rep.max == Some(0) {
            return Ok(());
        }
        let (before, reg_len) = (self.insts.len(), self.reg_len);
        self.c(&rep.sub)?;
        if self.insts.len() == before {
            return Ok(());
        }
        self.insts.truncate(before);
        self.reg_len = reg_len;
        for _ in 0..rep.min {
            self.c(&rep.sub)?;
        }
        let max = match rep.max {
            None => return self.c_loop(&rep.sub, greedy),
            Some(max) => max,
        };
        // x{0,3} is compiled as (?:x(?:x(?:x)?)?)?, so every optional copy
        // skips to the same end.
        let mut splits = vec![];
        for _ in rep.min..max {
            let split = self.empty_split()?;
            splits.push((split, self.insts.len()));
            self.c(&rep.sub)?;
        }
        let end = self.insts.len();
        for (split, body) in splits {
            self.set_split_greedy(split, body, end, greedy);
        }
        Ok(())
    }

    /// Compiles an unbounded loop. When the body can match the empty string,
    /// each iteration is guarded by a null check so that an iteration that
    /// consumes nothing leaves the loop instead of running forever.
    fn c_loop(&mut self, sub: &Ast, greedy: bool) -> Result<(), CompileError> {
        let reg = if sub.can_be_empty() {
            self.memoizable = false;
            self.reg_len += 1;
            Some(self.reg_len - 1)
        } else {
            None
        };
        let split = self.empty_split()?;
        let body = self.insts.len();
        if let Some(reg) = reg {
            self.push(Inst::NullCheckStart { reg })?;
        }
        self.c(sub)?;
        let check = match reg {
            None => None,
            Some(reg) => Some(self.push(Inst::NullCheckEnd { reg, exit: 0 })?),
        };
        self.push(Inst::Jump(split))?;
        let end = self.insts.len();
        self.set_split_greedy(split, body, end, greedy);
        if let (Some(check), Some(reg)) = (check, reg) {
            self.insts[check] = Inst::NullCheckEnd { reg, exit: end };
        }
        Ok(())
    }

    fn c_backref(&mut self, backref: &Backref) -> Result<(), CompileError> {
        let group = match backref.target {
            BackrefTarget::Number(number) => number,
            BackrefTarget::Name(ref name) => {
                match self.group_info.to_index(name) {
                    Some(index) => index,
                    None => {
                        return Err(CompileError::backref(
                            backref.position,
                            ERR_DANGLING_NAME,
                        ))
                    }
                }
            }
        };
        if group == 0 || group >= self.group_info.group_len() {
            return Err(CompileError::backref(
                backref.position,
                ERR_DANGLING_NUMBER,
            ));
        }
        self.memoizable = false;
        self.push(Inst::Backref { group, fold: backref.fold })?;
        Ok(())
    }

    fn push(&mut self, inst: Inst) -> Result<InstPtr, CompileError> {
        if let Some(limit) = self.config.get_size_limit() {
            if self.insts.len() >= limit {
                return Err(CompileError::other(0, ERR_TOO_BIG));
            }
        }
        self.insts.push(inst);
        Ok(self.insts.len() - 1)
    }

    fn empty_split(&mut self) -> Result<InstPtr, CompileError> {
        self.push(Inst::Split { x: 0, y: 0 })
    }

    fn empty_jump(&mut self) -> Result<InstPtr, CompileError> {
        self.push(Inst::Jump(0))
    }

    fn set_split(&mut self, pc: InstPtr, x: InstPtr, y: InstPtr) {
        self.insts[pc] = Inst::Split { x, y };
    }

    fn set_split_greedy(
        &mut self,
        pc: InstPtr,
        body: InstPtr,
        end: InstPtr,
        greedy: bool,
    ) {
        if greedy {
            self.set_split(pc, body, end);
        } else {
            self.set_split(pc, end, body);
        }
    }

    fn set_jump(&mut self, pc: InstPtr, to: InstPtr) {
        self.insts[pc] = Inst::Jump(to);
    }
}

/// Builds the capture table of a pattern.
///
/// The walk is a pre-order traversal, so groups are visited in the textual
/// order of their opening parentheses, which is also the order in which the
/// parser numbered them.
fn group_info(ast: &Ast) -> Result<GroupInfo, CompileError> {
    fn collect<'a>(
        ast: &'a Ast,
        parent: usize,
        groups: &mut Vec<(Option<&'a str>, usize, usize)>,
    ) {
        if let Ast::Group(Group {
            kind: GroupKind::Capture { index, ref name, position },
            ref sub,
        }) = *ast
        {
            groups.push((name.as_deref(), parent, position));
            debug_assert_eq!(index, groups.len());
            collect(sub, index, groups);
            return;
        }
        for child in ast.children() {
            collect(child, parent, groups);
        }
    }

    let mut groups = vec![];
    collect(ast, 0, &mut groups);
    GroupInfo::new(groups.iter().map(|&(name, parent, _)| (name, parent)))
        .map_err(|err| {
            let position = groups
                .get(err.group_index().wrapping_sub(1))
                .map_or(0, |&(_, _, position)| position);
            CompileError::other(position, ERR_DUPLICATE_NAME)
        })
}

/// Returns true when every match of the given expression must begin with
/// an assertion that only holds at one position of a search.
fn is_anchored(ast: &Ast) -> bool {
    match *ast {
        Ast::Look(Look::StartText) | Ast::Look(Look::SearchStart) => true,
        Ast::Concat(ref asts) => asts.first().map_or(false, is_anchored),
        Ast::Alternation(ref asts) => asts.iter().all(is_anchored),
        Ast::Group(ref group) => match group.kind {
            GroupKind::LookAhead { .. } => false,
            _ => is_anchored(&group.sub),
        },
        Ast::Repetition(ref rep) => rep.min > 0 && is_anchored(&rep.sub),
        _ => false,
    }
}

/// Appends the case sensitive literal that every match of `ast` begins
/// with to `prefix`. Returns true when all of `ast` was a literal, in which
/// case whatever follows `ast` may extend the prefix.
fn literal_prefix(ast: &Ast, prefix: &mut String) -> bool {
    match *ast {
        Ast::Empty => true,
        Ast::Literal { ch, fold: false } => {
            prefix.push(ch);
            true
        }
        Ast::Concat(ref asts) => {
            asts.iter().all(|a| literal_prefix(a, prefix))
        }
        Ast::Group(ref group) => match group.kind {
            GroupKind::Capture { .. } | GroupKind::NonCapture => {
                literal_prefix(&group.sub, prefix)
            }
            _ => false,
        },
        Ast::Repetition(ref rep) if rep.min > 0 => {
            literal_prefix(&rep.sub, prefix);
            false
        }
        _ => false,
    }
}
